//! Docbridge server binary.

use clap::{Parser, Subcommand};
use docbridge_engine::{AiProvider, ProviderConfig};
use docbridge_gateway::{GatewayConfig, GatewayServer};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docbridge", about = "Docbridge — PDF workspace Q&A service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "docbridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Deserialize)]
struct DocbridgeConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default = "default_documents_dir")]
    documents_dir: String,
    provider: ProviderConfig,
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_documents_dir() -> String {
    "/Shared/docbridge".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            cli.config.display(),
            e
        )
    })?;
    let mut config: DocbridgeConfig = toml::from_str(&config_str)?;

    // The OpenAI key may live in the environment instead of the config.
    if config.provider.provider == AiProvider::OpenAi && config.provider.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.provider.api_key = key;
        }
    }
    config
        .provider
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid provider config: {e}"))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let app = GatewayServer::build(GatewayConfig {
                documents_dir: config.documents_dir,
                provider: config.provider,
            });

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Docbridge gateway listening on {addr}");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
