//! Terminal symptom checker.
//!
//! Produces the same fixed layout as the web symptom-checker widget so that the message is
//! picked up by [`crate::extract`].

use crate::extract::SYMPTOMS_MARKER;

pub const SYMPTOM_CATALOG: &[(&str, &[&str])] = &[
    ("Vaginal", &["Discharge", "Bleeding", "Itching", "Dryness", "Odor"]),
    ("Pelvic", &["Pain", "Pressure", "Cramping", "Fullness"]),
    (
        "Uterine",
        &["Menstrual irregularities", "Heavy periods", "Spotting", "Missed periods"],
    ),
    (
        "Breast",
        &["Pain", "Lumps", "Discharge", "Tenderness", "Changes in appearance"],
    ),
    (
        "Urinary",
        &["Frequent urination", "Pain when urinating", "Urgency", "Incontinence"],
    ),
    (
        "General",
        &["Fatigue", "Fever", "Nausea", "Lower back pain", "Abdominal bloating"],
    ),
];

const NOT_PROVIDED: &str = "Not provided";
const NONE_PROVIDED: &str = "None provided";

#[derive(Debug, Clone, Default)]
pub struct SymptomForm {
    pub symptoms: Vec<String>,
    pub age: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub last_period: Option<String>,
    pub additional_info: Option<String>,
}

impl SymptomForm {
    /// Resolve a comma-separated answer into symptoms.
    ///
    /// `area.index` picks from [`SYMPTOM_CATALOG`] (e.g. `2.3` is "Pelvic Cramping"); anything
    /// else is taken verbatim.
    pub fn parse_symptoms(answer: &str) -> Vec<String> {
        answer
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|item| catalog_entry(item).unwrap_or_else(|| item.to_string()))
            .collect()
    }

    pub fn render(&self) -> String {
        let or_not_provided = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_PROVIDED.into());
        format!(
            "{SYMPTOMS_MARKER}
{symptoms}

Personal information:
- Age: {age}
- Height: {height}
- Weight: {weight}
- Last period date: {last_period}

Additional information:
{additional}",
            symptoms = self.symptoms.join(", "),
            age = or_not_provided(&self.age),
            height = or_not_provided(&self.height),
            weight = or_not_provided(&self.weight),
            last_period = or_not_provided(&self.last_period),
            additional = self.additional_info.as_deref().unwrap_or(NONE_PROVIDED),
        )
    }
}

/// Numbered catalog listing shown before asking for symptoms.
pub fn catalog_listing() -> String {
    SYMPTOM_CATALOG
        .iter()
        .enumerate()
        .map(|(a, (area, symptoms))| {
            let items = symptoms
                .iter()
                .enumerate()
                .map(|(s, name)| format!("{}.{} {}", a + 1, s + 1, name))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{area}: {items}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn catalog_entry(code: &str) -> Option<String> {
    let (area, symptom) = code.split_once('.')?;
    let area: usize = area.parse().ok()?;
    let symptom: usize = symptom.parse().ok()?;
    let (area_name, symptoms) = SYMPTOM_CATALOG.get(area.checked_sub(1)?)?;
    let name = symptoms.get(symptom.checked_sub(1)?)?;
    Some(format!("{area_name} {name}"))
}
