//! Relay — one-to-one WebSocket message relay
//!
//! Every client that connects is assigned an id. A client sends
//! `{"Userid": "<id>", "Message": "<text>"}` and the relay forwards the
//! text to the connection with that id, if it is online.
//!
//! Usage:
//!   relay                                 # Default port 7070, path /test/oneToOne
//!   relay --port 8080                     # Custom port
//!   relay --path /ws --cors               # Custom endpoint, permissive CORS
//!   relay --verbose --log-file            # Debug logs to ~/.relay/logs/relay.log

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_server::{ConnectionRegistry, RelayServer};
use relay_transport::{OUTBOUND_BUFFER_SIZE, TransportConfig, TransportServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relay", about = "One-to-one WebSocket message relay")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, default_value = "7070")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// WebSocket endpoint path
    #[arg(long, default_value = "/test/oneToOne")]
    path: String,

    /// Maximum concurrent connections (unlimited if omitted)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,

    /// Frames queued per connection before further sends to it are dropped
    #[arg(long, default_value_t = OUTBOUND_BUFFER_SIZE)]
    outbound_buffer: usize,

    /// Don't send clients their connection id on connect
    #[arg(long)]
    no_welcome: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file (defaults to ~/.relay/logs/relay.log if no path given)
    #[arg(long, default_missing_value = "DEFAULT", num_args = 0..=1)]
    log_file: Option<String>,
}

impl Cli {
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            port: self.port,
            hostname: self.hostname.clone(),
            path: self.path.clone(),
            max_connections: self.max_connections,
            enable_cors: self.cors,
            send_welcome: !self.no_welcome,
            outbound_buffer: self.outbound_buffer,
        }
    }
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let Some(log_file_arg) = cli.log_file.as_deref() else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(());
    };

    let log_path = if log_file_arg == "DEFAULT" {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".relay/logs/relay.log")
    } else {
        PathBuf::from(log_file_arg)
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    eprintln!("Logging to {}", log_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let registry = Arc::new(ConnectionRegistry::new());
    let relay = Arc::new(RelayServer::with_registry(registry.clone()));

    let mut transport = TransportServer::start_shared(cli.transport_config(), relay)
        .await
        .context("failed to start relay transport")?;

    println!();
    println!("  Relay running");
    println!("    ws://{}:{}{}", cli.hostname, transport.port(), transport.path());
    println!("    http://{}:{}/health", cli.hostname, transport.port());
    match cli.max_connections {
        Some(max) => println!("    max connections: {max}"),
        None => println!("    max connections: unlimited"),
    }
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("Shutdown requested with {} connections open", registry.count());
    println!();
    println!("  Shutting down...");
    transport.stop().await;
    println!("  Relay stopped.");
    Ok(())
}
