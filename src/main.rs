//! ru-pii-guard - PII detection and redaction for Russian and English text
//!
//! Runs the HTTP API or analyzes text from the command line.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ru_pii_guard::{
    api::build_app,
    config::GuardConfig,
    privacy::{handler::PiiState, PiiAnalyzer},
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ru-pii-guard")]
#[command(version)]
#[command(about = "PII detection and redaction for Russian and English text")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PII_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Detect PII and print validated entities as JSON
    Analyze(InputArgs),

    /// Print the anonymized text and entities as JSON
    Anonymize(InputArgs),

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Text language ("ru" or "en"); detected when omitted
    #[arg(short, long)]
    language: Option<String>,

    /// Read text from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Text to analyze; stdin when neither text nor --file is given
    text: Option<String>,
}

impl InputArgs {
    fn read_text(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ru_pii_guard={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = GuardConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Analyze(input) => {
            let analyzer = PiiAnalyzer::from_config(&config)?;
            let text = input.read_text()?;
            let analysis = analyzer.analyze(&text, input.language.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Anonymize(input) => {
            let analyzer = PiiAnalyzer::from_config(&config)?;
            let text = input.read_text()?;
            let result = analyzer.anonymize(&text, input.language.as_deref(), None)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(config: GuardConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let analyzer = PiiAnalyzer::from_config(&config)?;
    let state = PiiState {
        analyzer: Arc::new(analyzer),
    };
    let app = build_app(state, &config.server.cors_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("ru-pii-guard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

fn show_config(config: Option<&GuardConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    println!("{}", config.to_toml()?);
    Ok(())
}
