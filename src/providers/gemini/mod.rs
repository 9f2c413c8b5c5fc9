use crate::core::error::AssistError;
use crate::providers::{GenerationOptions, LLMProvider, TextStream};
use async_trait::async_trait;

mod client;
mod types;

use client::GeminiClient;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn with_endpoint(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: GeminiClient::new(endpoint, api_key, model),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn get_response(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AssistError> {
        self.client.generate_content(prompt, options).await
    }

    async fn get_response_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TextStream, AssistError> {
        self.client.generate_content_stream(prompt, options).await
    }

    fn model(&self) -> &str {
        &self.client.model
    }

    fn set_model(&mut self, model: &str) {
        self.client.model = model.to_string();
    }
}
