use clap::Parser;
use gemini_chat_widget::{Position, Theme};
use std::path::PathBuf;

/// Terminal chat widget for the company chat proxy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// A single message to send to the chat proxy
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Open the chat panel interactively
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Base URL of the chat proxy; relative API URLs are resolved against it
    #[arg(long, env = "CHAT_PROXY_URL", default_value = "http://127.0.0.1:5000")]
    pub base_url: String,

    /// Chat endpoint, as a path or an absolute URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Path to a TOML file with widget options
    #[arg(short, long)]
    pub options: Option<PathBuf>,

    /// Colour theme (default, dark, light, custom)
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Panel position (bottom-right, bottom-left, top-right, top-left)
    #[arg(long)]
    pub position: Option<Position>,

    /// Panel header title
    #[arg(long)]
    pub title: Option<String>,

    /// Hide message timestamps
    #[arg(long, default_value_t = false)]
    pub no_timestamps: bool,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
