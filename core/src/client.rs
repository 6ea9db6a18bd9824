use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::credential::Credential;
use crate::errors::{GeminiError, GeminiResult};
use crate::provider::CompletionProvider;
use crate::types::*;

/// Header carrying the key, so it never ends up in a URL or an error message
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    credential: Credential,
    model_name: String,
    api_base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini API client.
    ///
    /// A missing key is not an error here; requests fail with
    /// `ConfigError` until one is configured.
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            credential: Credential::new(config.api_key.clone()),
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        }
    }

    /// Same client and key, different model.
    pub fn with_model(&self, model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model_name
    }

    /// Get the generateContent URL for the configured model
    fn get_generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model_name
        )
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let api_key = self.credential.usable().ok_or_else(|| {
            GeminiError::ConfigError("API key is not configured".to_string())
        })?;

        let url = self.get_generate_url();
        debug!(model = %self.model_name, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;
            warn!(status = status.as_u16(), "Gemini API returned an error status");

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: describe_error_body(&error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))?;

        Ok(response_body)
    }

    /// Sends a single prompt and returns the generated text
    pub async fn generate_text(&self, prompt: &str) -> GeminiResult<String> {
        let request = GenerateContentRequest::from_prompt(prompt);
        let response = self.generate_content(request).await?;
        extract_text_from_response(&response)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> GeminiResult<String> {
        self.generate_text(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Joins the text of every part of the first candidate.
pub fn extract_text_from_response(response: &GenerateContentResponse) -> GeminiResult<String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GeminiError::ResponseError("No candidates in response".to_string()))?;

    let content = candidate
        .content
        .as_ref()
        .ok_or_else(|| GeminiError::ResponseError("No content in candidate".to_string()))?;

    let text: String = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(GeminiError::ResponseError("No text in content".to_string()));
    }

    Ok(text)
}

/// Pulls the human-readable message out of an API error body, falling back
/// to the raw body.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("API request failed: [{}] {}", status, envelope.error.message),
            None => format!("API request failed: {}", envelope.error.message),
        },
        Err(_) => format!("API request failed: {}", body),
    }
}
