// Core functionality shared by the chat proxy and the chat widget:
// - API client for Gemini
// - Request/response data structures
// - Company profile and prompt assembly
// - Credential handling
// - Configuration loading
// - Shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

// Completion provider abstraction used by the proxy
pub mod provider;
pub use provider::CompletionProvider;

// Provider credential and placeholder detection
pub mod credential;
pub use credential::{Credential, PLACEHOLDER_API_KEY};

// Company profile and prompt assembly
pub mod profile;
pub use profile::{CompanyProfile, ProfileEntries, PromptBuilder};
