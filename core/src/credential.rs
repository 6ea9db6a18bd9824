use std::fmt;

/// Value shipped in `env.example`; a key equal to this was never filled in.
pub const PLACEHOLDER_API_KEY: &str = "your_valid_gemini_api_key_here";

/// Remediation text returned to callers when no usable key is configured.
pub const MISSING_KEY_REMEDIATION: &str = "Please set a valid Gemini API key in your .env file. Get your API key from https://aistudio.google.com/app/apikey";

/// Provider credential injected into the proxy at startup.
///
/// `Debug` and `Display` never print the key itself, only its masked form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(value: Option<String>) -> Self {
        Self(value)
    }

    pub fn none() -> Self {
        Self(None)
    }

    /// The key, if one is set and is not the placeholder.
    pub fn usable(&self) -> Option<&str> {
        match self.0.as_deref() {
            Some(key) if !key.trim().is_empty() && key != PLACEHOLDER_API_KEY => Some(key),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.usable().is_some()
    }

    /// `abcd...wxyz` for long keys, `****` for short ones.
    pub fn masked(&self) -> String {
        match self.usable() {
            Some(key) => mask_key(key),
            None => "<not configured>".to_string(),
        }
    }

    /// Replaces every occurrence of the key in `text`.
    pub fn scrub(&self, text: &str) -> String {
        match self.usable() {
            Some(key) => text.replace(key, "[redacted]"),
            None => text.to_string(),
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
