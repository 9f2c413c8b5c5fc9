use crate::core::error::AssistError;
use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod base_client;
pub mod gemini;

pub type TextStream = BoxStream<'static, Result<String, AssistError>>;

/// Sampling settings sent along with a prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    const LOW_TEMPERATURE: f32 = 0.1;

    /// First pass over a structured symptom submission.
    pub fn draft() -> Self {
        Self {
            max_output_tokens: Some(200),
            temperature: Some(Self::LOW_TEMPERATURE),
        }
    }

    /// Second pass that rewrites the draft.
    pub fn rewrite() -> Self {
        Self {
            max_output_tokens: Some(400),
            temperature: Some(Self::LOW_TEMPERATURE),
        }
    }

    /// Free-text answer delivered in one piece.
    pub fn single_shot() -> Self {
        Self {
            max_output_tokens: Some(500),
            temperature: Some(Self::LOW_TEMPERATURE),
        }
    }

    /// Streamed answers leave the length to the model.
    pub fn streaming() -> Self {
        Self {
            max_output_tokens: None,
            temperature: Some(Self::LOW_TEMPERATURE),
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn get_response(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AssistError>;

    async fn get_response_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TextStream, AssistError>;

    fn model(&self) -> &str;

    fn set_model(&mut self, model: &str);
}
