use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use order_api::commands::{check_config, serve};
use order_api::config::StoreBackend;

#[derive(Parser)]
#[command(name = "order-api")]
#[command(about = "Order service backed by a key-value store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service until Ctrl+C or SIGTERM
    Serve {
        /// Config file (default: order-api.toml if present)
        #[arg(short, long, env = "ORDER_API_CONFIG")]
        config: Option<PathBuf>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long, env = "ORDER_API_PORT")]
        port: Option<u16>,
        /// Store backend (overrides store.backend)
        #[arg(long, value_enum, env = "ORDER_API_STORE")]
        store: Option<StoreBackend>,
        /// redb database file (overrides store.path)
        #[arg(long, env = "ORDER_API_STORE_PATH")]
        store_path: Option<PathBuf>,
    },
    /// Validate the configuration and exit
    CheckConfig {
        /// Config file (default: order-api.toml if present)
        #[arg(short, long, env = "ORDER_API_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            store,
            store_path,
        } => {
            serve::execute(
                config,
                serve::Overrides {
                    port,
                    store,
                    store_path,
                },
            )
            .await
        },
        Commands::CheckConfig { config } => check_config::execute(config),
    }
}
