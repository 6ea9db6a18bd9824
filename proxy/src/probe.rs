//! Operator checks run from the command line before serving traffic.

use gemini_core::{CompletionProvider, Credential};
use thiserror::Error;
use tracing::{info, warn};

/// Prompt used to verify a key
pub const KEY_CHECK_PROMPT: &str = "Say hello";

/// Prompt used to probe each model
pub const MODEL_CHECK_PROMPT: &str = "Hello";

/// Models probed when none are named
pub const DEFAULT_PROBE_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-2.0-flash"];

/// Usual reasons a key check fails, shown to the operator
pub const FAILURE_HINTS: &[&str] = &[
    "Your API key is invalid or expired",
    "You have exceeded your API quota",
    "The Gemini API service is currently unavailable",
];

#[derive(Error, Debug, PartialEq)]
pub enum ProbeError {
    #[error("API key not configured")]
    Unconfigured,

    #[error("{0}")]
    Failed(String),
}

/// Outcome of probing one model
#[derive(Debug, PartialEq)]
pub struct ModelProbe {
    pub model: String,
    pub outcome: Result<String, String>,
}

/// Sends the key-check prompt and returns the model's answer.
pub async fn check_key(
    provider: &dyn CompletionProvider,
    credential: &Credential,
) -> Result<String, ProbeError> {
    if !credential.is_configured() {
        return Err(ProbeError::Unconfigured);
    }

    info!(model = %provider.model_name(), api_key = %credential.masked(), "Testing Gemini API key");
    provider
        .complete(KEY_CHECK_PROMPT)
        .await
        .map_err(|e| ProbeError::Failed(credential.scrub(&e.to_string())))
}

/// Probes each model in turn; one failing model does not stop the others.
pub async fn check_models<P, F>(
    models: &[String],
    credential: &Credential,
    make_provider: F,
) -> Vec<ModelProbe>
where
    P: CompletionProvider,
    F: Fn(&str) -> P,
{
    let mut probes = Vec::with_capacity(models.len());
    for model in models {
        let provider = make_provider(model);
        let outcome = match provider.complete(MODEL_CHECK_PROMPT).await {
            Ok(text) => {
                info!(%model, "Model works");
                Ok(text)
            }
            Err(e) => {
                let detail = credential.scrub(&e.to_string());
                warn!(%model, error = %detail, "Model check failed");
                Err(detail)
            }
        };
        probes.push(ModelProbe {
            model: model.clone(),
            outcome,
        });
    }
    probes
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gemini_core::errors::{GeminiError, GeminiResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EchoModel {
        model: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionProvider for EchoModel {
        async fn complete(&self, prompt: &str) -> GeminiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.model.contains("1.5") {
                Err(GeminiError::HttpError {
                    status_code: 404,
                    message: format!("model {} not found", self.model),
                })
            } else {
                Ok(format!("{} says: {}", self.model, prompt))
            }
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }

    fn key() -> Credential {
        Credential::new(Some("AIzaSyExampleKey123".to_string()))
    }

    #[tokio::test]
    async fn test_check_key_requires_configured_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = EchoModel {
            model: "gemini-2.0-flash".to_string(),
            calls: calls.clone(),
        };

        let result = check_key(&provider, &Credential::none()).await;
        assert_eq!(result, Err(ProbeError::Unconfigured));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let answer = check_key(&provider, &key()).await.unwrap();
        assert_eq!(answer, "gemini-2.0-flash says: Say hello");
    }

    #[tokio::test]
    async fn test_check_models_continues_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let models: Vec<String> = DEFAULT_PROBE_MODELS.iter().map(|m| m.to_string()).collect();

        let probes = check_models(&models, &key(), |model| EchoModel {
            model: model.to_string(),
            calls: calls.clone(),
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].model, "gemini-1.5-flash");
        assert!(probes[0].outcome.as_ref().unwrap_err().contains("not found"));
        assert_eq!(
            probes[1].outcome,
            Ok("gemini-2.0-flash says: Hello".to_string())
        );
    }
}
