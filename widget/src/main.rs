use clap::Parser;
use gemini_chat_widget::output::print_usage_instructions;
use gemini_chat_widget::{ChatTransport, ChatWidget, HttpTransport, WidgetOptions};
use log::info;
use std::error::Error;
use std::sync::Arc;

mod app;
mod cli;
mod logging;

use crate::cli::Args;
use crate::logging::log_error;

/// Main function - Builds the widget and talks to the chat proxy
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse();
    logging::init(args.verbose);

    // Widget options: file first, then command-line overrides
    let mut options = match WidgetOptions::load_or_default(args.options.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            log_error(&format!("Failed to load widget options: {:#}", e));
            return Err(e.into());
        }
    };
    if let Some(api_url) = args.api_url {
        options.api_url = api_url;
    }
    if let Some(theme) = args.theme {
        options.theme = theme;
    }
    if let Some(position) = args.position {
        options.position = position;
    }
    if let Some(title) = args.title {
        options.header_title = title;
    }
    if args.no_timestamps {
        options.show_timestamp = false;
    }

    let transport = Arc::new(HttpTransport::new(&args.base_url, &options.api_url));
    info!("Widget options: {:?}", options);
    let mut widget = ChatWidget::new(options);

    if args.interactive {
        let transport: Arc<dyn ChatTransport> = transport;
        if let Err(e) = crate::app::run_interactive_chat(&mut widget, transport).await {
            log_error(&format!("Error in interactive chat: {}", e));
        }
    } else if let Some(prompt) = args.prompt {
        if let Err(e) = crate::app::run_single_query(prompt, &mut widget, transport.as_ref()).await {
            log_error(&format!("Error processing prompt: {}", e));
        }
    } else {
        // No prompt and not interactive, show usage
        print_usage_instructions();
    }

    Ok(())
}
