use anyhow::Context;
use clap::Parser;
use signalr_client_rs::{SignalRClient, SignalRClientOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Keeps a SignalR hub connection alive until interrupted
#[derive(Parser, Debug)]
#[command(name = "signalr-client", version, about)]
struct Cli {
    /// Protocol for the handshake requests: http or https
    #[arg(long, env = "SIGNALR_SCHEME", default_value = "https")]
    scheme: String,

    /// Server address (host with optional port)
    #[arg(long, env = "SIGNALR_ADDR")]
    addr: Option<String>,

    /// Hub to connect to
    #[arg(long, env = "SIGNALR_HUBNAME")]
    hubname: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, alias = "logFile", env = "SIGNALR_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let Some(addr) = cli.addr.filter(|a| !a.is_empty()) else {
        tracing::error!("Address is empty");
        return ExitCode::from(2);
    };
    let Some(hubname) = cli.hubname.filter(|h| !h.is_empty()) else {
        tracing::error!("Hub name is empty");
        return ExitCode::from(2);
    };

    let options = SignalRClientOptions {
        scheme: cli.scheme,
        ..Default::default()
    };
    let client = match SignalRClient::new(addr, hubname, options) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match client.run(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("cannot install logger: {}", e))?;
            tracing::info!("---");
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("cannot install logger: {}", e))?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for interrupt: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt");
}
