//! Persona instructions, fixed chat copy and prompt renderers.

use crate::extract::StructuredSubmission;

/// Domain-lock and persona instructions prepended to every free-text prompt.
pub const SYSTEM_PROMPT: &str = "\
You are a gynecology specialist AI.
1. Domain-lock: You only answer questions about gynecology. If the user asks anything else, politely say:
   \"I'm here to help only with gynecological issues.\"
2. Tone: Warm, empathetic, doctor-like.
3. Data gathering: Subtly collect key details (age, height, weight, symptoms, duration, medical history)
   one question at a time, like a clinical symptom checker.
4. Strict rules to follow:
   - Don't use 'referral to a real doctor if serious or unclear' again and again
   - One question at a time, don't make the user intimidated.";

pub const WELCOME_MESSAGE: &str =
    "Welcome to your Gynecologist Assistant! How can I help you today?";

pub const SYMPTOM_CHECKER_INTRO: &str = "I'm here to help! Type /form to pick the symptoms \
you're experiencing from a checklist, or describe them in your own words.";

pub const UPLOAD_HINT: &str = "If you have any medical documents to share, you can type \
'upload file' and I'll help you process them.";

pub const UPLOAD_COMMAND: &str = "upload file";

pub const UPLOAD_REQUEST: &str = "Please upload a text file with your medical information.";

pub const STRUCTURED_ACK: &str = "Thank you for providing this detailed information. \
I'll analyze your symptoms and provide guidance.";

pub const STRUCTURED_PROGRESS: &str = "Analyzing your information...";

const NONE_PROVIDED: &str = "None provided";

const REWRITE_INSTRUCTION: &str = "\" modify the above text to remove all the doctor \
recommendation type texts and the \"should not be considered medical advice\" kind of text from \
it and make it less intimidating. Keep the modified text and add the possible causes and \
information. Suggest safe, general advice (e.g., hygiene tips, routine habits).";

/// Free-text prompt: persona, recent conversation, then the new message.
pub fn free_text(history: &str, message: &str) -> String {
    format!(
        "{SYSTEM_PROMPT}

Conversation history:
{history}

The user said: \"{message}\"

Provide a helpful, accurate, and empathetic response.
Focus on giving medically sound information, but remind the user to consult a healthcare
professional for proper diagnosis and treatment."
    )
}

/// First-pass prompt over a symptom-form submission.
pub fn structured(submission: &StructuredSubmission) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    format!(
        "The user has shared the following information about their gynecological health:

Symptoms: {symptoms}
Age: {age}
Height: {height}
Weight: {weight}
Last menstrual period: {last_period}

Additional information: {additional}

As a gynecologist assistant AI, please respond.

Be empathetic, informative, and remember to emphasize that this is not a substitute for professional medical evaluation.",
        symptoms = submission.symptoms.join(", "),
        age = field(&submission.age),
        height = field(&submission.height),
        weight = field(&submission.weight),
        last_period = field(&submission.last_period),
        additional = submission.additional_info.as_deref().unwrap_or(NONE_PROVIDED),
    )
}

/// Second-pass prompt: the draft followed by the rewrite instruction.
pub fn rewrite(draft: &str) -> String {
    format!("{draft}{REWRITE_INSTRUCTION}")
}

pub fn document_analysis(content: &str) -> String {
    format!(
        "This is a medical document from a patient seeking gynecological advice. \
The document contains: {content}\n\n\
Please analyze this document and provide helpful, professional insights."
    )
}

pub fn upload_ack(file_name: &str, char_count: usize) -> String {
    format!(
        "I've received your file '{file_name}'. It contains {char_count} characters. Let me analyze it."
    )
}

pub fn generation_apology(details: &str) -> String {
    format!("Sorry, I encountered an error: {details}")
}

pub fn file_apology(details: &str) -> String {
    format!("Sorry, I couldn't process your file: {details}")
}
