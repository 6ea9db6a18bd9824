use std::sync::Arc;

use gemini_core::credential::MISSING_KEY_REMEDIATION;
use gemini_core::{CompletionProvider, Credential, PromptBuilder};
use gemini_ipc::chat_request::{ChatErrorKind, ChatReply, ChatRequest, ErrorBody};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failures of a single chat request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("Message is required")]
    BadRequest,

    #[error("API key not configured: {remediation}")]
    Unconfigured { remediation: String },

    #[error("Failed to generate response: {details}")]
    GenerationFailed { details: String },
}

impl ProxyError {
    pub fn kind(&self) -> ChatErrorKind {
        match self {
            Self::BadRequest => ChatErrorKind::BadRequest,
            Self::Unconfigured { .. } => ChatErrorKind::Unconfigured,
            Self::GenerationFailed { .. } => ChatErrorKind::GenerationFailed,
        }
    }

    /// The JSON body sent to the caller
    pub fn to_body(&self) -> ErrorBody {
        let body = ErrorBody::new(self.kind());
        match self {
            Self::BadRequest => body,
            Self::Unconfigured { remediation } => body.with_message(remediation.clone()),
            Self::GenerationFailed { details } => body.with_details(details.clone()),
        }
    }
}

/// Turns one user message into one provider call.
///
/// Holds nothing mutable; every field is shared read-only between
/// concurrent requests.
pub struct ChatProxy {
    prompts: PromptBuilder,
    credential: Credential,
    provider: Arc<dyn CompletionProvider>,
}

impl ChatProxy {
    pub fn new(
        prompts: PromptBuilder,
        credential: Credential,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            prompts,
            credential,
            provider,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatReply, ProxyError> {
        let message = request.message().ok_or(ProxyError::BadRequest)?;

        if !self.credential.is_configured() {
            warn!("Rejecting chat request: API key not configured");
            return Err(ProxyError::Unconfigured {
                remediation: MISSING_KEY_REMEDIATION.to_string(),
            });
        }

        let prompt = self.prompts.build(message);
        debug!(
            prompt_len = prompt.len(),
            model = %self.provider.model_name(),
            "Generating content"
        );

        match self.provider.complete(&prompt).await {
            Ok(response) => {
                info!(response_len = response.len(), "Generated response");
                Ok(ChatReply { response })
            }
            Err(e) => {
                let details = self.credential.scrub(&e.to_string());
                error!(
                    error = %details,
                    api_key = %self.credential.masked(),
                    "Gemini request failed"
                );
                Err(ProxyError::GenerationFailed { details })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gemini_core::errors::{GeminiError, GeminiResult};
    use gemini_core::{CompanyProfile, PLACEHOLDER_API_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::test;

    struct StubProvider {
        reply: Result<String, String>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl StubProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }

        fn failing(detail: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(detail.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        async fn complete(&self, prompt: &str) -> GeminiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply
                .clone()
                .map_err(|message| GeminiError::HttpError {
                    status_code: 429,
                    message,
                })
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }
    }

    fn acme() -> Arc<CompanyProfile> {
        Arc::new(CompanyProfile {
            name: "Acme".to_string(),
            services: vec!["Consulting".to_string(), "Support".to_string()],
            ..CompanyProfile::default()
        })
    }

    fn proxy(credential: Credential, provider: Arc<StubProvider>) -> ChatProxy {
        ChatProxy::new(PromptBuilder::with_profile(acme()), credential, provider)
    }

    fn valid_key() -> Credential {
        Credential::new(Some("AIzaSyExampleKey123".to_string()))
    }

    #[test]
    async fn test_success_relays_provider_text() {
        let provider = StubProvider::replying("We offer consulting and support.");
        let proxy = proxy(valid_key(), provider.clone());

        let reply = proxy
            .handle(&ChatRequest::new("What are your services?"))
            .await
            .unwrap();

        assert_eq!(reply.response, "We offer consulting and support.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let prompt = provider.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Consulting, Support"));
        assert!(prompt.ends_with("User: What are your services?\nAssistant:"));
    }

    #[test]
    async fn test_missing_message_never_calls_provider() {
        let provider = StubProvider::replying("unused");
        let proxy = proxy(valid_key(), provider.clone());

        assert_eq!(
            proxy.handle(&ChatRequest::new("")).await,
            Err(ProxyError::BadRequest)
        );
        assert_eq!(
            proxy.handle(&ChatRequest::default()).await,
            Err(ProxyError::BadRequest)
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    async fn test_missing_message_wins_over_missing_key() {
        let provider = StubProvider::replying("unused");
        let proxy = proxy(Credential::none(), provider);
        assert_eq!(
            proxy.handle(&ChatRequest::default()).await,
            Err(ProxyError::BadRequest)
        );
    }

    #[test]
    async fn test_unset_or_placeholder_key_is_unconfigured() {
        for credential in [
            Credential::none(),
            Credential::new(Some(PLACEHOLDER_API_KEY.to_string())),
        ] {
            let provider = StubProvider::replying("unused");
            let proxy = proxy(credential, provider.clone());

            let err = proxy
                .handle(&ChatRequest::new("What are your services?"))
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ChatErrorKind::Unconfigured);
            let body = err.to_body();
            assert_eq!(body.error, "API key not configured");
            assert_eq!(body.message.as_deref(), Some(MISSING_KEY_REMEDIATION));
            assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    async fn test_provider_failure_is_generation_failed() {
        let provider = StubProvider::failing("quota exceeded");
        let proxy = proxy(valid_key(), provider);

        let err = proxy.handle(&ChatRequest::new("Hello")).await.unwrap_err();

        assert_eq!(err.kind(), ChatErrorKind::GenerationFailed);
        let body = err.to_body();
        assert_eq!(body.error, "Failed to generate response");
        assert!(body.details.unwrap().contains("quota exceeded"));
        assert!(body.message.is_none());
    }

    #[test]
    async fn test_failure_details_never_contain_key() {
        let provider = StubProvider::failing("bad request for key AIzaSyExampleKey123");
        let proxy = proxy(valid_key(), provider);

        let err = proxy.handle(&ChatRequest::new("Hello")).await.unwrap_err();
        match err {
            ProxyError::GenerationFailed { details } => {
                assert!(!details.contains("AIzaSyExampleKey123"));
                assert!(details.contains("[redacted]"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    async fn test_bare_prompt_mode() {
        let provider = StubProvider::replying("Hi!");
        let proxy = ChatProxy::new(PromptBuilder::bare(), valid_key(), provider.clone());

        proxy.handle(&ChatRequest::new("Hello")).await.unwrap();
        assert_eq!(
            provider.last_prompt.lock().unwrap().as_deref(),
            Some("User: Hello\nAssistant:")
        );
    }
}
