use async_trait::async_trait;

use crate::errors::GeminiResult;

/// Something that turns a text prompt into generated text.
///
/// The proxy only ever holds this trait object, so tests can swap the
/// Gemini client for a stub.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one prompt and waits for the whole, non-streamed answer.
    async fn complete(&self, prompt: &str) -> GeminiResult<String>;

    /// Model identifier used for logging.
    fn model_name(&self) -> &str;
}
