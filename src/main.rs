// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use search_gateway::{server, GatewayConfig, SearchGateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "search-gateway")]
#[command(about = "Managed search REST dialect served from Solr")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the configured indexes, then serve HTTP
    Serve {
        /// Index definitions file (overrides INDEX_DEFINITIONS)
        #[arg(long)]
        indexes: Option<PathBuf>,
        /// Listen address (overrides LISTEN_ADDR)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Bootstrap the configured indexes and exit
    Bootstrap {
        /// Index definitions file (overrides INDEX_DEFINITIONS)
        #[arg(long)]
        indexes: Option<PathBuf>,
    },
}

fn load_config(indexes: Option<PathBuf>) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let mut config = GatewayConfig::from_env()?;
    if indexes.is_some() {
        config.index_definitions = indexes;
    }
    Ok(config)
}

async fn bootstrap(config: GatewayConfig) -> Result<Arc<SearchGateway>, Box<dyn std::error::Error>> {
    let definitions = config.load_index_definitions()?;
    let gateway = Arc::new(SearchGateway::connect(config)?);
    let report = gateway.bootstrap(definitions).await?;
    tracing::info!(
        created = report.created.len(),
        existing = report.existing.len(),
        "Bootstrap complete"
    );
    Ok(gateway)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { indexes, listen } => {
            let mut config = load_config(indexes)?;
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            let gateway = bootstrap(config).await?;
            server::serve(gateway).await?;
        }
        Commands::Bootstrap { indexes } => {
            bootstrap(load_config(indexes)?).await?;
        }
    }

    Ok(())
}
