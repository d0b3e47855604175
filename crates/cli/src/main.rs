//! jfsnotify CLI
//!
//! Client tool for the remote filesystem watch service: resolves dial
//! targets, probes the service, and builds or inspects wire messages.

mod cli;
mod client;
mod config;
mod inspect;

use clap::Parser;
use cli::{Cli, Command, ControlKind};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use config::Config;
use jfsnotify_protocol::{Event, Message, Op, resolve};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let timeout_override = match &cli.command {
        Command::Probe { timeout_ms, .. } => *timeout_ms,
        _ => None,
    };
    let config = Config::load(cli.config.as_ref())?
        .with_target(cli.target())
        .with_log_level(cli.log_level.clone())
        .with_connect_timeout_ms(timeout_override);

    init_logging(&config.client.log_level)?;

    match cli.command {
        Command::Resolve { .. } => cmd_resolve(&config),
        Command::Probe { .. } => cmd_probe(&config).await,
        Command::EncodeEvent { name, op, key } => cmd_encode_event(name, op, key),
        Command::EncodeControl {
            kind,
            watcher,
            paths,
        } => cmd_encode_control(kind, watcher, paths),
        Command::Inspect { hex, input } => cmd_inspect(hex, input),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn cmd_resolve(config: &Config) -> Result<()> {
    let target = resolve(&config.client.target);
    tracing::debug!(input = %config.client.target, "Resolved target");

    println!("network: {}", target.network);
    println!("address: {}", target.address);
    Ok(())
}

async fn cmd_probe(config: &Config) -> Result<()> {
    let target = resolve(&config.client.target);
    let timeout = config.client.connect_timeout();

    tracing::info!(
        network = %target.network,
        address = %target.address,
        timeout_ms = config.client.connect_timeout_ms,
        "Probing service"
    );

    match client::probe(&target, timeout).await {
        Ok(peer) => {
            println!("Service is reachable at {target} (peer {peer})");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Probe failed");
            Err(e.wrap_err(format!("Service is not reachable at {target}")))
        }
    }
}

fn cmd_encode_event(name: String, op: Op, key: String) -> Result<()> {
    let message = Message::Event {
        events: vec![Event::new(name, op, key)],
    };
    let bytes = message.to_bytes()?;
    println!("{}", inspect::to_hex(&bytes));
    Ok(())
}

fn cmd_encode_control(kind: ControlKind, watcher: String, paths: Vec<String>) -> Result<()> {
    let message = kind.build(watcher, paths).map_err(|e| eyre!(e))?;
    let bytes = message.to_bytes()?;
    println!("{}", inspect::to_hex(&bytes));
    Ok(())
}

fn cmd_inspect(hex: Option<String>, input: Option<PathBuf>) -> Result<()> {
    let data = match (hex, input) {
        (Some(hex), _) => inspect::from_hex(&hex)?,
        (None, Some(path)) if path.as_os_str() != "-" => std::fs::read(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        (None, _) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .wrap_err("failed to read stdin")?;
            buf
        }
    };

    if data.is_empty() {
        bail!("no message data");
    }

    let text = inspect::describe(&data)?;
    print!("{text}");
    Ok(())
}
