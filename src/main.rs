//! sessiond - A UDP Session Cache Daemon
//!
//! This is the main entry point for the sessiond server.
//! It binds the UDP socket, starts the maintenance trigger and runs the
//! request loop until Ctrl+C or SIGTERM.

use anyhow::Context;
use sessiond::commands::CommandHandler;
use sessiond::config::{CliAction, Config};
use sessiond::connection::DatagramHandler;
use sessiond::maintenance::{MaintenanceTrigger, TriggerConfig};
use sessiond::storage::CacheStore;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!(
        r#"
sessiond - A UDP Session Cache Daemon

USAGE:
    sessiond [OPTIONS] [PORT]

OPTIONS:
    -h, --host <HOST>           Host to bind to (default: {host})
    -p, --port <PORT>           UDP port to listen on (default: {port})
    -i, --interval <SECS>       Seconds between stats reports (default: 300)
    -m, --max-entries <N>       Maximum number of cached sessions (default: 100000)
    -v, --version               Print version information
        --help                  Print this help message

EXAMPLES:
    sessiond                        # Listen on 0.0.0.0:{port}
    sessiond 6000                   # Listen on port 6000
    sessiond --host 127.0.0.1       # Loopback only
    sessiond -i 60                  # Report every minute

SIGNALS:
    SIGUSR1                         Print a stats report now
    SIGINT, SIGTERM                 Shut down
"#,
        host = sessiond::DEFAULT_HOST,
        port = sessiond::DEFAULT_PORT,
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = match Config::from_args() {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            print_help();
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("sessiond version {}", sessiond::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    // Set up logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Bind the socket; the trigger sends its sentinels from this same socket
    let socket = UdpSocket::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind UDP socket on {}", config.bind_address()))?;
    let socket = Arc::new(socket);

    let store = CacheStore::with_capacity(config.max_entries);
    let handler = DatagramHandler::new(Arc::clone(&socket), CommandHandler::new(store))
        .context("failed to read local socket address")?;

    println!("sessiond {} started on port {}/UDP", sessiond::VERSION, config.port);
    info!(
        addr = %handler.local_addr(),
        max_entries = config.max_entries,
        interval_secs = config.report_interval.as_secs(),
        "sessiond started"
    );

    let _trigger = MaintenanceTrigger::start(
        Arc::clone(&socket),
        handler.sentinel_target(),
        TriggerConfig {
            interval: config.report_interval,
            on_user_signal: true,
        },
    );

    tokio::select! {
        _ = handler.run() => {}
        _ = shutdown_signal() => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
