use gemini_core::config::{get_default_config_file, load_toml_or_default, GeminiConfig};
use gemini_core::errors::GeminiResult;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "gemini-chat";
const CONFIG_FILE_NAME: &str = "proxy.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// JSON document with the company profile
    pub profile_path: PathBuf,
    /// Send only `User: ...\nAssistant:` without company context
    pub bare_prompt: bool,
    /// Allow cross-origin requests from any origin
    pub cors: bool,
    pub log_level: String,
    pub gemini: GeminiConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            profile_path: PathBuf::from("config/company_profile.json"),
            bare_prompt: false,
            cors: true,
            log_level: "info".to_string(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> GeminiResult<Self> {
        let mut config: Self = load_toml_or_default(path)?;
        // A partial [gemini] table leaves holes; fill them from the defaults.
        config.gemini = GeminiConfig::default().merge(&config.gemini);
        Ok(config)
    }

    /// Loads `~/.config/gemini-chat/proxy.toml`, or the defaults when it is absent
    pub fn load_from_default() -> GeminiResult<Self> {
        let path = Self::default_path()?;
        Self::load_from_file(&path)
    }

    pub fn default_path() -> GeminiResult<PathBuf> {
        get_default_config_file(APP_NAME, CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.cors);
        assert!(!config.bare_prompt);
        assert_eq!(config.gemini.model_name.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"0.0.0.0:8080\"").unwrap();
        writeln!(file, "[gemini]").unwrap();
        writeln!(file, "model_name = \"gemini-1.5-flash\"").unwrap();

        let config = ProxyConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.gemini.model_name.as_deref(), Some("gemini-1.5-flash"));
        assert!(config.gemini.api_base_url.is_some());
        assert_eq!(config.profile_path, PathBuf::from("config/company_profile.json"));
    }
}
