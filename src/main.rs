use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use peer_mesh::config::PeerConfig;
use peer_mesh::node::PeerNode;
use peer_mesh::registry::{Registry, Role};
use peer_mesh::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "peer-mesh")]
#[command(version)]
#[command(about = "Self-registering sales peers with server failover")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a peer
    Run(RunArgs),

    /// Inspect the shared registry
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
}

// =============================================================================
// Peer Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    /// Initial role (seller, manager or server). Defaults to a random
    /// choice between seller and manager.
    role: Option<Role>,

    /// Shared registry snapshot
    #[arg(long, default_value = "servers.json")]
    registry: PathBuf,

    /// Host to bind and to reach other peers on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// First port to scan
    #[arg(long, default_value = "3000")]
    port_start: u16,

    /// Last port to scan (inclusive)
    #[arg(long, default_value = "3100")]
    port_end: u16,

    /// Timeout for probes and ledger calls. Unset keeps the transport default.
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Run an election when the registry lists no server at all
    #[arg(long)]
    elect_on_missing_server: bool,
}

// =============================================================================
// Registry Commands
// =============================================================================

#[derive(clap::Subcommand, Debug)]
enum RegistryCommands {
    /// List registered peers in candidate order
    List {
        /// Shared registry snapshot
        #[arg(long, default_value = "servers.json")]
        registry: PathBuf,

        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Command Implementations
// =============================================================================

async fn run_peer(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = PeerConfig {
        registry_path: args.registry,
        host: args.host,
        port_range_start: args.port_start,
        port_range_end: args.port_end,
        probe_timeout_ms: args.probe_timeout_ms,
        elect_on_missing_server: args.elect_on_missing_server,
        ..Default::default()
    };

    let shutdown = install_shutdown_handler();
    let node = PeerNode::start(config, args.role).await?;
    node.run(shutdown).await?;
    Ok(())
}

async fn list_registry(
    path: PathBuf,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let peers = Registry::new(path).list().await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&peers)?),
        OutputFormat::Table => {
            if peers.is_empty() {
                println!("No peers registered.");
                return Ok(());
            }
            println!("{:<4} {:<40} {:<8} {:<6}", "#", "ID", "ROLE", "PORT");
            println!("{}", "-".repeat(60));
            for (position, peer) in peers.iter().enumerate() {
                println!(
                    "{:<4} {:<40} {:<8} {:<6}",
                    position,
                    peer.id,
                    peer.role.to_string(),
                    peer.port
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run(run) => run_peer(run).await,
        Commands::Registry { command } => match command {
            RegistryCommands::List { registry, output } => list_registry(registry, output).await,
        },
    }
}
