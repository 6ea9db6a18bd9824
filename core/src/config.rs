use crate::errors::{GeminiError, GeminiResult};
use crate::types::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration struct for Gemini API
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub api_base_url: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: Some(DEFAULT_MODEL.to_string()),
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
        }
    }
}

// Keep the key out of debug logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &crate::Credential::new(self.api_key.clone()))
            .field("model_name", &self.model_name)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl GeminiConfig {
    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
        }
    }
}

/// Loads a TOML file if it exists, otherwise returns the default value
pub fn load_toml_or_default<T>(path: &Path) -> GeminiResult<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GeminiError::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        GeminiError::ConfigError(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> GeminiResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        GeminiError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get a config file path inside the default config directory
pub fn get_default_config_file(app_name: &str, file_name: &str) -> GeminiResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_merge_prefers_other() {
        let base = GeminiConfig::default();
        let overrides = GeminiConfig {
            api_key: Some("from-cli".to_string()),
            model_name: None,
            api_base_url: None,
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.api_key.as_deref(), Some("from-cli"));
        assert_eq!(merged.model_name.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(merged.api_base_url.as_deref(), Some(DEFAULT_API_BASE_URL));
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config: GeminiConfig = load_toml_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, GeminiConfig::default());
    }

    #[test]
    fn test_load_and_reject_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model_name = \"gemini-1.5-flash\"").unwrap();
        let config: GeminiConfig = load_toml_or_default(file.path()).unwrap();
        assert_eq!(config.model_name.as_deref(), Some("gemini-1.5-flash"));
        assert!(config.api_key.is_none());

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "model_name = [").unwrap();
        let result: GeminiResult<GeminiConfig> = load_toml_or_default(bad.path());
        assert!(matches!(result, Err(GeminiError::ConfigError(_))));
    }

    #[test]
    fn test_debug_masks_key() {
        let config = GeminiConfig {
            api_key: Some("AIzaSyExampleKey123".to_string()),
            ..GeminiConfig::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("AIzaSyExampleKey123"));
        assert!(printed.contains("AIza...y123"));
    }
}
