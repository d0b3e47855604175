//! Command-line interface for jfsnotify.
//!
//! Provides commands for resolving dial targets, probing a running service,
//! and building or inspecting protocol messages.

use clap::{Parser, Subcommand, ValueEnum};
use jfsnotify_protocol::{Message, Op};
use std::path::PathBuf;

/// jfsnotify - client tool for the remote filesystem watch service
#[derive(Debug, Parser)]
#[command(name = "jfsnotify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "JFSNOTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "JFSNOTIFY_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which network and address a target resolves to
    Resolve {
        /// Target string (defaults to the configured target)
        target: Option<String>,
    },

    /// Check whether the service accepts connections
    Probe {
        /// Override dial target
        #[arg(short, long)]
        target: Option<String>,

        /// Connect timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print the hex encoding of an EVENT message with one record
    EncodeEvent {
        /// Event name (watched path or watcher name)
        #[arg(short, long)]
        name: String,

        /// Operations, e.g. "create|write" or "0x20"
        #[arg(short, long, default_value = "write", value_parser = parse_op)]
        op: Op,

        /// Correlation key
        #[arg(short, long, default_value = "")]
        key: String,
    },

    /// Print the hex encoding of a control message
    EncodeControl {
        /// Control message type
        #[arg(value_enum)]
        kind: ControlKind,

        /// Watcher name
        #[arg(short, long)]
        watcher: String,

        /// Paths (watch and unwatch only)
        paths: Vec<String>,
    },

    /// Decode a message and print its contents
    Inspect {
        /// Message as a hex string
        #[arg(long, conflicts_with = "input")]
        hex: Option<String>,

        /// File holding the raw message, or "-" for stdin
        input: Option<PathBuf>,
    },
}

/// Control message types accepted by `encode-control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ControlKind {
    Watch,
    Unwatch,
    Clear,
    Suspend,
    Resume,
}

impl ControlKind {
    /// Build the message, rejecting paths on types that carry none.
    pub fn build(self, watcher: String, paths: Vec<String>) -> Result<Message, String> {
        match self {
            Self::Watch => Ok(Message::Watch { watcher, paths }),
            Self::Unwatch => Ok(Message::Unwatch { watcher, paths }),
            _ if !paths.is_empty() => Err(format!("{self:?} takes no paths").to_lowercase()),
            Self::Clear => Ok(Message::Clear { watcher }),
            Self::Suspend => Ok(Message::Suspend { watcher }),
            Self::Resume => Ok(Message::Resume { watcher }),
        }
    }
}

/// Parse an operation list separated by `|` or `,`.
///
/// Each item is an operation name or a numeric code (decimal or `0x` hex).
pub fn parse_op(s: &str) -> Result<Op, String> {
    let mut op = Op::empty();
    for item in s.split(['|', ',']).map(str::trim).filter(|i| !i.is_empty()) {
        let bits = if let Some(named) = Op::from_name_ignore_case(item) {
            named.bits()
        } else if let Some(hex) = item.strip_prefix("0x") {
            u32::from_str_radix(hex, 16).map_err(|e| format!("invalid op {item:?}: {e}"))?
        } else {
            item.parse::<u32>()
                .map_err(|_| format!("unknown op {item:?}"))?
        };
        op |= Op::from_bits_retain(bits);
    }
    Ok(op)
}

impl Cli {
    /// Target override given on the command line, if any
    pub fn target(&self) -> Option<String> {
        match &self.command {
            Command::Resolve { target } | Command::Probe { target, .. } => target.clone(),
            _ => None,
        }
    }
}
