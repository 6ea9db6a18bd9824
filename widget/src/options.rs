use anyhow::{Context, Result};
use gemini_ipc::chat_request::CHAT_ROUTE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Corner of the screen the widget is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Position {
    pub fn is_top(&self) -> bool {
        matches!(self, Position::TopRight | Position::TopLeft)
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Position::BottomRight | Position::TopRight)
    }

    /// CSS-style offsets from the anchored edges, `(vertical, horizontal)`
    pub fn offsets(&self) -> [(&'static str, &'static str); 2] {
        let vertical = if self.is_top() { "top" } else { "bottom" };
        let horizontal = if self.is_right() { "right" } else { "left" };
        [(vertical, "20px"), (horizontal, "20px")]
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom-right" => Ok(Position::BottomRight),
            "bottom-left" => Ok(Position::BottomLeft),
            "top-right" => Ok(Position::TopRight),
            "top-left" => Ok(Position::TopLeft),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
    Custom,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Theme::Default),
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "custom" => Ok(Theme::Custom),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Resolved colours of a theme, as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub header_start: String,
    pub header_end: String,
    pub button: String,
    pub chat_background: String,
    pub user_bubble: String,
    pub bot_bubble: String,
    pub input_background: String,
    pub text: String,
    pub placeholder: String,
}

/// Presentation options of the widget. None of them change the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetOptions {
    pub api_url: String,
    pub position: Position,
    pub theme: Theme,
    pub primary_color: String,
    pub secondary_color: String,
    pub header_title: String,
    pub header_subtitle: String,
    pub welcome_message: String,
    pub placeholder_text: String,
    pub show_timestamp: bool,
    pub button_icon: String,
    pub close_icon: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            api_url: CHAT_ROUTE.to_string(),
            position: Position::default(),
            theme: Theme::default(),
            primary_color: "#667eea".to_string(),
            secondary_color: "#764ba2".to_string(),
            header_title: "AI Assistant".to_string(),
            header_subtitle: "How can I help you today?".to_string(),
            welcome_message: "👋 Hi! I'm your AI assistant. Ask me anything!".to_string(),
            placeholder_text: "Type your message...".to_string(),
            show_timestamp: true,
            button_icon: "💬".to_string(),
            close_icon: "✕".to_string(),
        }
    }
}

impl WidgetOptions {
    /// Loads options from a TOML file with camelCase keys
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read widget options {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse widget options {}", path.display()))
    }

    /// `~/.config/gemini-chat/widget.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("gemini-chat").join("widget.toml"))
    }

    /// Loads the default file when present, otherwise the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn palette(&self) -> Palette {
        let p = |s: &str| s.to_string();
        match self.theme {
            Theme::Dark => Palette {
                header_start: p("#2d3748"),
                header_end: p("#1a202c"),
                button: p("#2d3748"),
                chat_background: p("#1a202c"),
                user_bubble: p("#4a5568"),
                bot_bubble: p("#2d3748"),
                input_background: p("#2d3748"),
                text: p("#ffffff"),
                placeholder: p("#a0aec0"),
            },
            Theme::Light => Palette {
                header_start: p("#e2e8f0"),
                header_end: p("#cbd5e0"),
                button: p("#4a5568"),
                chat_background: p("#ffffff"),
                user_bubble: p("#4a5568"),
                bot_bubble: p("#edf2f7"),
                input_background: p("#edf2f7"),
                text: p("#1a202c"),
                placeholder: p("#718096"),
            },
            Theme::Custom => Palette {
                header_start: self.primary_color.clone(),
                header_end: self.secondary_color.clone(),
                button: self.primary_color.clone(),
                chat_background: p("#ffffff"),
                user_bubble: self.primary_color.clone(),
                bot_bubble: p("#ffffff"),
                input_background: p("#f7fafc"),
                text: p("#1a202c"),
                placeholder: p("#718096"),
            },
            Theme::Default => Palette {
                header_start: p("#667eea"),
                header_end: p("#764ba2"),
                button: p("#667eea"),
                chat_background: p("#ffffff"),
                user_bubble: p("#667eea"),
                bot_bubble: p("#ffffff"),
                input_background: p("#f7fafc"),
                text: p("#1a202c"),
                placeholder: p("#718096"),
            },
        }
    }
}

/// Parses `#rrggbb` (or `rrggbb`) into its components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
