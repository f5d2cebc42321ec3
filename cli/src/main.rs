use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use coordinator_transport::transport::CLOSE_NORMAL;
use coordinator_transport::{
    CloseEvent, CloseHandler, ConfigError, CoordinatorConfig, DataHandler, SessionId, TransportError, TransportKind,
    transport_for,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("connect failed: {0}")]
    Transport(#[from] TransportError),
    #[error("stdin read failed: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("could not render output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "coordinator-cli", about = "Coordinator transport client")]
struct Cli {
    #[arg(long, env = "COORDINATOR_HOST")]
    host: Option<String>,

    /// `websocket` (or `ws`) or `tcp`.
    #[arg(long, env = "COORDINATOR_TRANSPORT")]
    transport: Option<TransportKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print inbound payloads as JSON lines.
    Connect(ConnectArgs),
    /// Print the wire value of a session id.
    Encode { session_id: SessionId },
}

#[derive(Args, Debug)]
struct ConnectArgs {
    #[arg(long, env = "COORDINATOR_APP_ID")]
    app_id: String,

    #[arg(long)]
    session_id: SessionId,

    #[arg(long, env = "COORDINATOR_TOKEN")]
    token: String,

    #[arg(long, help = "Send a keepalive every N seconds")]
    keepalive_secs: Option<u64>,
}

enum Event {
    Data(Bytes),
    Close(CloseEvent),
}

/// One JSON line on stdout.
#[derive(Serialize, Debug)]
#[serde(tag = "event", rename_all = "lowercase")]
enum Output<'a> {
    Data { len: usize, hex: String },
    Close(&'a CloseEvent),
}

impl Output<'_> {
    fn data(bytes: &[u8]) -> Self {
        Self::Data { len: bytes.len(), hex: hex::encode(bytes) }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Encode { session_id } => {
            println!("{}", session_id.wire_value());
            Ok(())
        }
        Command::Connect(args) => {
            let mut config = CoordinatorConfig::from_env()?;
            if let Some(host) = cli.host {
                config.host = host;
            }
            if let Some(transport) = cli.transport {
                config.transport = transport;
            }
            run_connect(&config, args).await
        }
    }
}

async fn run_connect(config: &CoordinatorConfig, args: ConnectArgs) -> Result<(), CliError> {
    let (tx, mut events) = mpsc::unbounded_channel();
    let data_tx = tx.clone();
    let on_data: DataHandler = Box::new(move |bytes| {
        let _ = data_tx.send(Event::Data(bytes));
    });
    let on_close: CloseHandler = Box::new(move |event| {
        let _ = tx.send(Event::Close(event));
    });

    let mut transport = transport_for(config, &args.app_id);
    transport.connect(&args.session_id, &args.token, on_data, on_close).await?;
    info!(app_id = %args.app_id, session = %args.session_id, "connected");

    let mut keepalive = args.keepalive_secs.filter(|secs| *secs > 0).map(|secs| {
        let period = Duration::from_secs(secs);
        interval_at(Instant::now() + period, period)
    });
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Data(bytes)) => print_json(&Output::data(&bytes))?,
                Some(Event::Close(event)) => {
                    print_json(&Output::Close(&event))?;
                    return Ok(());
                }
                // Both callbacks dropped without a close event: silent close.
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt; closing");
                transport.disconnect(Some(CLOSE_NORMAL));
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => transport.write(line.as_bytes()),
                None => {
                    debug!("stdin closed; disconnecting");
                    stdin_open = false;
                    transport.disconnect(None);
                }
            },
            () = tick(keepalive.as_mut()) => transport.pong(),
        }
    }
}

async fn tick(keepalive: Option<&mut Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn print_json(value: &Output<'_>) -> Result<(), CliError> {
    let rendered = serde_json::to_string(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
