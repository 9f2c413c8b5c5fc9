//! Decomposition of symptom-form messages.
//!
//! The symptom form renders a fixed layout: a symptom list introduced by [`SYMPTOMS_MARKER`],
//! then labelled personal details and free-text notes. Extraction is label-anchored and lossy;
//! a missing label leaves its field empty and never fails.

use regex::Regex;
use std::sync::LazyLock;

/// Sentinel phrase that marks a message as a structured submission.
pub const SYMPTOMS_MARKER: &str = "I'm experiencing the following symptoms:";

static SYMPTOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| block_pattern(SYMPTOMS_MARKER));
static AGE_RE: LazyLock<Regex> = LazyLock::new(|| line_pattern("Age:"));
static HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| line_pattern("Height:"));
static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| line_pattern("Weight:"));
static LAST_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| line_pattern("Last period date:"));
static ADDITIONAL_INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| block_pattern("Additional information:"));

// Label, optional whitespace (newlines included), then the rest of that line.
fn line_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"{}\s*(.+?)(?:\n|$)", regex::escape(label)))
        .expect("static line pattern")
}

// Label, optional whitespace, then everything up to a blank line or the end of the text.
fn block_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?s){}\s*(.+?)(?:\n\n|$)", regex::escape(label)))
        .expect("static block pattern")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredSubmission {
    pub symptoms: Vec<String>,
    pub age: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub last_period: Option<String>,
    pub additional_info: Option<String>,
}

pub fn is_structured(message: &str) -> bool {
    message.contains(SYMPTOMS_MARKER)
}

pub fn extract(message: &str) -> StructuredSubmission {
    let symptoms = capture(&SYMPTOMS_RE, message)
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    StructuredSubmission {
        symptoms,
        age: capture(&AGE_RE, message),
        height: capture(&HEIGHT_RE, message),
        weight: capture(&WEIGHT_RE, message),
        last_period: capture(&LAST_PERIOD_RE, message),
        additional_info: capture(&ADDITIONAL_INFO_RE, message),
    }
}

fn capture(re: &Regex, message: &str) -> Option<String> {
    re.captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
