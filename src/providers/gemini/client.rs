use crate::core::error::AssistError;
use crate::providers::base_client::HttpClient;
use crate::providers::gemini::types::*;
use crate::providers::{GenerationOptions, TextStream};
use tracing::{debug, warn};

/// Parser for Gemini streaming responses
pub fn gemini_stream_parser(data: String) -> Result<Option<String>, AssistError> {
    let mut content = String::new();

    for line in data.lines() {
        let Some(json_str) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let json_str = json_str.trim();
        if json_str.is_empty() {
            continue;
        }

        let parsed: GeminiResponse = serde_json::from_str(json_str).map_err(|e| {
            AssistError::Serialization(format!(
                "Failed to parse stream data: {}. Data: '{}'",
                e, json_str
            ))
        })?;

        if let Some(error) = parsed.error {
            return Err(AssistError::Api(error.message));
        }
        if let Some(text) = parsed.text() {
            content.push_str(&text);
        }
    }

    if content.is_empty() {
        Ok(None)
    } else {
        Ok(Some(content))
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    pub model: String,
    client: HttpClient,
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let mut client = HttpClient::new(base_url);

        // Gemini takes the key as a query parameter rather than a header
        client.add_query_param("key", api_key);

        Self { client, model }
    }

    pub async fn generate_content(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AssistError> {
        let payload = build_payload(prompt, options);
        let response = self
            .client
            .post(
                &format!("v1beta/models/{}:generateContent", self.model),
                &payload,
            )
            .await?;

        let response_body: String = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&response_body).map_err(|e| {
            AssistError::Serialization(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_text(parsed)
    }

    pub async fn generate_content_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TextStream, AssistError> {
        let payload = build_payload(prompt, options);
        let mut client = self.client.clone();
        client.add_query_param("alt", "sse".to_string());
        let response = client
            .post(
                &format!("v1beta/models/{}:streamGenerateContent", self.model),
                &payload,
            )
            .await?;

        debug!(model = %self.model, "stream opened");
        Ok(client.stream_response(response, gemini_stream_parser))
    }
}

fn build_payload(prompt: &str, options: &GenerationOptions) -> GeminiRequest {
    let generation_config = if options.max_output_tokens.is_some() || options.temperature.is_some()
    {
        Some(GenerationConfig {
            max_output_tokens: options.max_output_tokens,
            temperature: options.temperature,
        })
    } else {
        None
    };

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(prompt.to_string()),
            }],
        }],
        generation_config,
    }
}

fn extract_text(parsed: GeminiResponse) -> Result<String, AssistError> {
    if let Some(error) = &parsed.error {
        return Err(AssistError::Api(error.message.clone()));
    }
    if let Some(text) = parsed.text() {
        return Ok(text);
    }

    let reason = parsed
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .or_else(|| parsed.candidates.first().and_then(|c| c.finish_reason.clone()));
    warn!(?reason, "Gemini returned no text");
    match reason {
        Some(reason) => Err(AssistError::Api(format!(
            "No valid response from Gemini ({})",
            reason
        ))),
        None => Err(AssistError::Api("No valid response from Gemini".to_string())),
    }
}
