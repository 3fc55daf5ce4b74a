use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use flare_core::{IceServerConfig, default_ice_servers};
use flare_server::{RelayConfig, RelayService, router, spawn_sweeper};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flare")]
#[command(about = "Signaling relay for peer-to-peer audio/video sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Zero-member rooms older than this many seconds are swept.
        #[arg(long, default_value_t = 30 * 60)]
        stale_room_secs: u64,

        /// Interval of the background sweep, in seconds.
        #[arg(long, default_value_t = 5 * 60)]
        sweep_every_secs: u64,

        /// TURN server url; overrides the built-in ICE server list.
        /// Falls back to the TURN_URL environment variable.
        #[arg(long)]
        turn_url: Option<String>,

        #[arg(long)]
        turn_username: Option<String>,

        #[arg(long)]
        turn_credential: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            stale_room_secs,
            sweep_every_secs,
            turn_url,
            turn_username,
            turn_credential,
        } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();

            let turn_url = turn_url.or_else(|| std::env::var("TURN_URL").ok());
            let turn_username = turn_username.or_else(|| std::env::var("TURN_USERNAME").ok());
            let turn_credential =
                turn_credential.or_else(|| std::env::var("TURN_CREDENTIAL").ok());

            let ice_servers = match turn_url {
                Some(url) => vec![IceServerConfig {
                    urls: vec![url],
                    username: turn_username,
                    credential: turn_credential,
                }],
                None => default_ice_servers(),
            };

            let config = RelayConfig {
                stale_room_timeout: Duration::from_secs(stale_room_secs),
                sweep_interval: Duration::from_secs(sweep_every_secs),
                ice_servers,
            };

            serve(port, config).await
        }
    }
}

async fn serve(port: u16, config: RelayConfig) -> Result<()> {
    println!("{}", "🚀 Starting flare signaling relay...".green().bold());

    let relay = RelayService::new(config);
    let sweeper = spawn_sweeper(relay.clone());
    let app = router(relay);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Signaling relay listening on http://{}", addr);
    println!("   📡 WebSocket endpoint at ws://{addr}/ws");
    println!("   🌐 Health check at http://{addr}/");
    println!("   🧊 ICE servers at http://{addr}/api/ice-servers");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .await
        .context("Signaling relay crashed")?;

    sweeper.abort();
    Ok(())
}
