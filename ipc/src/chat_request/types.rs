use serde::{Deserialize, Serialize};

/// Route served by the proxy and called by the widget
pub const CHAT_ROUTE: &str = "/api/chat";

pub const BAD_REQUEST_LABEL: &str = "Message is required";
pub const UNCONFIGURED_LABEL: &str = "API key not configured";
pub const GENERATION_FAILED_LABEL: &str = "Failed to generate response";

/// A request from the widget to the proxy
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChatRequest {
    /// The text the user submitted. Absent and empty are both rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The message, if present and non-empty.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// A successful reply from the proxy
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
}

/// The body of every non-2xx reply from the proxy
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    /// One of the fixed labels; identifies the error kind.
    pub error: String,
    /// Remediation text meant for the end user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Diagnostic detail passed through from the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(kind: ChatErrorKind) -> Self {
        Self {
            error: kind.label().to_string(),
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kind(&self) -> ChatErrorKind {
        ChatErrorKind::from_label(&self.error)
    }
}

/// Error kinds of the chat contract, decoded from the `error` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Missing input, fixable by the caller (HTTP 400)
    BadRequest,
    /// Missing or placeholder provider key, fixable by the operator (HTTP 500)
    Unconfigured,
    /// The provider call failed (HTTP 500)
    GenerationFailed,
    /// A label this client does not know
    Unknown,
}

impl ChatErrorKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            BAD_REQUEST_LABEL => Self::BadRequest,
            UNCONFIGURED_LABEL => Self::Unconfigured,
            GENERATION_FAILED_LABEL => Self::GenerationFailed,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BadRequest => BAD_REQUEST_LABEL,
            Self::Unconfigured => UNCONFIGURED_LABEL,
            Self::GenerationFailed => GENERATION_FAILED_LABEL,
            Self::Unknown => "Unknown error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            _ => 500,
        }
    }
}
