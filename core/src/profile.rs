use crate::errors::{GeminiError, GeminiResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Static business context injected into every prompt.
///
/// Loaded once at startup and shared read-only between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub services: Vec<String>,
    /// Question key to answer, in document order.
    #[serde(default)]
    pub faq: ProfileEntries,
    #[serde(default)]
    pub contact: ProfileEntries,
}

/// Key/value pairs of a JSON object, kept in the order the document lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileEntries(Vec<(String, String)>);

impl ProfileEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, replacing the value in place when the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ProfileEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct ProfileEntriesVisitor;

impl<'de> Visitor<'de> for ProfileEntriesVisitor {
    type Value = ProfileEntries;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = ProfileEntries::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            entries.insert(key, value);
        }
        Ok(entries)
    }
}

impl<'de> Deserialize<'de> for ProfileEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProfileEntriesVisitor)
    }
}

impl CompanyProfile {
    /// Loads the profile from a JSON document
    pub fn load_from_file(path: &Path) -> GeminiResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeminiError::ConfigError(format!(
                "Failed to read company profile {}: {}",
                path.display(),
                e
            ))
        })?;

        let profile: Self = serde_json::from_str(&content).map_err(|e| {
            GeminiError::ConfigError(format!(
                "Failed to parse company profile {}: {}",
                path.display(),
                e
            ))
        })?;

        if profile.name.trim().is_empty() {
            return Err(GeminiError::ConfigError(format!(
                "Company profile {} has an empty name",
                path.display()
            )));
        }

        Ok(profile)
    }
}

/// Assembles the text prompt sent to the completion provider.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    profile: Option<Arc<CompanyProfile>>,
}

impl PromptBuilder {
    /// Frames every message with the company profile.
    pub fn with_profile(profile: Arc<CompanyProfile>) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    /// Sends only the conversation turn, with no company context.
    pub fn bare() -> Self {
        Self { profile: None }
    }

    pub fn profile(&self) -> Option<&CompanyProfile> {
        self.profile.as_deref()
    }

    pub fn build(&self, message: &str) -> String {
        let mut prompt = String::new();

        if let Some(profile) = &self.profile {
            let _ = writeln!(prompt, "You are an AI assistant for {}.", profile.name);
            prompt.push('\n');
            let _ = writeln!(prompt, "About the company:\n{}", profile.about);
            prompt.push('\n');
            let _ = writeln!(prompt, "Services offered:\n{}", profile.services.join(", "));
            prompt.push('\n');
            let _ = writeln!(prompt, "FAQ information:\n{}", render_entries(&profile.faq));
            prompt.push('\n');
            let _ = writeln!(
                prompt,
                "Contact information:\n{}",
                render_entries(&profile.contact)
            );
            prompt.push('\n');
        }

        let _ = write!(prompt, "User: {}\nAssistant:", message);
        prompt
    }
}

fn render_entries(entries: &ProfileEntries) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("- {}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}
