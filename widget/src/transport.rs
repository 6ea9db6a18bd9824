use async_trait::async_trait;
use gemini_ipc::chat_request::{ChatErrorKind, ChatReply, ChatRequest, ErrorBody};
use log::{debug, info};
use reqwest::Client;
use thiserror::Error;

/// Why a chat round trip produced no answer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatFailure {
    /// The proxy answered with a non-2xx status
    #[error("Server error {status}: {}", .kind.label())]
    Server {
        status: u16,
        kind: ChatErrorKind,
        message: Option<String>,
        details: Option<String>,
    },

    /// The proxy could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The proxy answered with a body we could not read
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// One outbound chat call
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, ChatFailure>;
}

/// Talks to the proxy over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// `api_url` may be absolute or a path resolved against `base_url`.
    pub fn new(base_url: &str, api_url: &str) -> Self {
        let url = resolve_url(base_url, api_url);
        info!("Using chat endpoint: {}", url);
        Self {
            client: Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, message: &str) -> Result<String, ChatFailure> {
        debug!("Posting chat message ({} bytes) to {}", message.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest::new(message))
            .send()
            .await
            .map_err(|e| ChatFailure::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChatFailure::Transport(format!("Failed to read response body: {}", e)))?;

        decode_response(status, &body)
    }
}

/// Turns a status and body into the response text or a tagged failure.
pub fn decode_response(status: u16, body: &[u8]) -> Result<String, ChatFailure> {
    if (200..300).contains(&status) {
        return serde_json::from_slice::<ChatReply>(body)
            .map(|reply| reply.response)
            .map_err(|e| ChatFailure::Malformed(e.to_string()));
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(error) => Err(ChatFailure::Server {
            status,
            kind: error.kind(),
            message: error.message,
            details: error.details,
        }),
        Err(_) => Err(ChatFailure::Server {
            status,
            kind: ChatErrorKind::Unknown,
            message: None,
            details: None,
        }),
    }
}

fn resolve_url(base_url: &str, api_url: &str) -> String {
    if api_url.starts_with("http://") || api_url.starts_with("https://") {
        return api_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        api_url.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("http://127.0.0.1:5000/", "/api/chat"),
            "http://127.0.0.1:5000/api/chat"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:5000", "https://bot.example/api/chat"),
            "https://bot.example/api/chat"
        );
    }

    #[test]
    fn test_decode_success() {
        assert_eq!(
            decode_response(200, br#"{"response":"Hello!"}"#),
            Ok("Hello!".to_string())
        );
        assert!(matches!(
            decode_response(200, b"<html>"),
            Err(ChatFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_tagged_errors() {
        let unconfigured = decode_response(
            500,
            br#"{"error":"API key not configured","message":"Set GEMINI_API_KEY"}"#,
        );
        assert_eq!(
            unconfigured,
            Err(ChatFailure::Server {
                status: 500,
                kind: ChatErrorKind::Unconfigured,
                message: Some("Set GEMINI_API_KEY".to_string()),
                details: None,
            })
        );

        let bad = decode_response(400, br#"{"error":"Message is required"}"#).unwrap_err();
        assert!(matches!(
            bad,
            ChatFailure::Server {
                kind: ChatErrorKind::BadRequest,
                ..
            }
        ));

        let gateway = decode_response(502, b"Bad Gateway").unwrap_err();
        assert!(matches!(
            gateway,
            ChatFailure::Server {
                status: 502,
                kind: ChatErrorKind::Unknown,
                ..
            }
        ));
    }
}
