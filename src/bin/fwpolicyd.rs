//! fwpolicyd: firewall policy service.
//!
//! Serves one command per TCP connection, or runs an interactive console.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use fwpolicy::{interactive, PolicyEngine, PolicyServer, ServerConfig};
use tokio::signal;

#[derive(Parser)]
#[command(name = "fwpolicyd")]
#[command(version)]
#[command(about = "In-memory firewall policy service", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["interactive", "port"])))]
struct Cli {
    /// Run an interactive console on stdin/stdout
    #[arg(short, long)]
    interactive: bool,

    /// TCP port to listen on
    port: Option<u16>,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Per-connection read/write timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    io_timeout: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let engine = Arc::new(PolicyEngine::new());

    let result = match cli.port {
        Some(port) if !cli.interactive => run_server(&cli, port, engine),
        _ => run_interactive(&engine),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_interactive(engine: &PolicyEngine) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Running interactive console");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    interactive::run(engine, stdin.lock(), stdout.lock())?;
    Ok(())
}

fn run_server(
    cli: &Cli,
    port: u16,
    engine: Arc<PolicyEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::new(port)
        .with_bind_addr(SocketAddr::new(cli.bind, port))
        .with_io_timeout(cli.io_timeout.map(Duration::from_secs));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = PolicyServer::new(config, engine);
        if let Some(timeout) = server.config().io_timeout {
            log::info!("Per-connection I/O timeout: {:?}", timeout);
        }
        let listener = server.bind().await?;
        server.serve_until(listener, wait_for_shutdown()).await?;
        log::info!("fwpolicyd stopped");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received SIGINT, shutting down");
        }
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down");
        }
    }
}
