use clap::{Parser, Subcommand};
use gemini_chat_proxy::config::ProxyConfig;
use gemini_chat_proxy::http_server;
use gemini_chat_proxy::probe::{self, ProbeError, DEFAULT_PROBE_MODELS, FAILURE_HINTS};
use gemini_chat_proxy::ChatProxy;
use gemini_core::client::GeminiClient;
use gemini_core::credential::MISSING_KEY_REMEDIATION;
use gemini_core::{CompanyProfile, Credential, PromptBuilder};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chat-proxy", about = "Company-profile chat proxy for the Gemini API")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gemini API key
    #[arg(short = 'k', long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model to use
    #[arg(short = 'o', long)]
    model: Option<String>,

    /// HTTP server address
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// Path to the company profile JSON document
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Send the bare conversation turn without company context
    #[arg(long)]
    bare_prompt: bool,

    /// Disable the permissive CORS layer
    #[arg(long)]
    no_cors: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /api/chat (the default)
    Serve,
    /// Send a short prompt to verify the configured API key
    CheckKey,
    /// Try each model with a short prompt and report which ones answer
    CheckModels {
        /// Models to try
        models: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env values become visible to clap's env fallbacks
    dotenvy::dotenv().ok();

    // Parse command line args
    let args = Args::parse();

    // Load config from file or use defaults
    let mut config = match &args.config {
        Some(path) => ProxyConfig::load_from_file(path),
        None => ProxyConfig::load_from_default(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Update config from CLI args
    if let Some(api_key) = args.api_key {
        config.gemini.api_key = Some(api_key);
    }
    if let Some(model) = args.model {
        config.gemini.model_name = Some(model);
    }
    if let Some(addr) = args.http_addr {
        config.bind_addr = addr;
    }
    if let Some(profile) = args.profile {
        config.profile_path = profile;
    }
    if args.bare_prompt {
        config.bare_prompt = true;
    }
    if args.no_cors {
        config.cors = false;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let credential = Credential::new(config.gemini.api_key.clone());
    let client = GeminiClient::new(&config.gemini);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, credential, client).await,
        Command::CheckKey => run_check_key(&client, &credential).await,
        Command::CheckModels { models } => run_check_models(&client, &credential, models).await,
    }
}

async fn serve(config: ProxyConfig, credential: Credential, client: GeminiClient) -> anyhow::Result<()> {
    let prompts = if config.bare_prompt {
        info!("Bare prompt mode: company profile is not injected");
        PromptBuilder::bare()
    } else {
        let profile = CompanyProfile::load_from_file(&config.profile_path).map_err(|e| {
            error!(error = %e, "Failed to load company profile");
            anyhow::anyhow!("Failed to load company profile: {}", e)
        })?;
        info!(
            company = %profile.name,
            path = %config.profile_path.display(),
            "Loaded company profile"
        );
        PromptBuilder::with_profile(Arc::new(profile))
    };

    info!(api_key = %credential.masked(), model = %client.model(), "Initialized Gemini client");

    let proxy = Arc::new(ChatProxy::new(prompts, credential, Arc::new(client)));
    http_server::run_server(proxy, config.bind_addr, config.cors).await
}

async fn run_check_key(client: &GeminiClient, credential: &Credential) -> anyhow::Result<()> {
    println!("Testing Gemini API with {}...", client.model());
    match probe::check_key(client, credential).await {
        Ok(answer) => {
            println!("API working! Response:");
            println!("{}", answer);
            println!("Your API key is working correctly.");
            Ok(())
        }
        Err(ProbeError::Unconfigured) => {
            eprintln!("ERROR: API key not configured!");
            eprintln!("{}", MISSING_KEY_REMEDIATION);
            Err(anyhow::anyhow!("API key not configured"))
        }
        Err(ProbeError::Failed(detail)) => {
            eprintln!("API Error: {}", detail);
            eprintln!("Possible reasons:");
            for (i, hint) in FAILURE_HINTS.iter().enumerate() {
                eprintln!("{}. {}", i + 1, hint);
            }
            Err(anyhow::anyhow!("API key check failed"))
        }
    }
}

async fn run_check_models(
    client: &GeminiClient,
    credential: &Credential,
    models: Vec<String>,
) -> anyhow::Result<()> {
    let models = if models.is_empty() {
        DEFAULT_PROBE_MODELS.iter().map(|m| m.to_string()).collect()
    } else {
        models
    };

    let probes = probe::check_models(&models, credential, |model| client.with_model(model)).await;
    for result in &probes {
        match &result.outcome {
            Ok(text) => println!("{} works: {}", result.model, text.trim()),
            Err(detail) => println!("{} error: {}", result.model, detail),
        }
    }

    if probes.iter().all(|p| p.outcome.is_err()) {
        return Err(anyhow::anyhow!("No model answered"));
    }
    Ok(())
}
