//! Dial target resolution.
//!
//! A single configuration string names both the socket family and the address:
//!
//! | target                  | network | address           |
//! |-------------------------|---------|-------------------|
//! | `localhost:8080`        | tcp     | `localhost:8080`  |
//! | `unix:/run/x.sock`      | unix    | `/run/x.sock`     |
//! | `unix:///run/x.sock`    | unix    | `/run/x.sock`     |
//! | `ipc://name`            | ipc     | `name`            |
//!
//! Anything that does not match a local-socket form is passed through untouched
//! as a TCP address. Resolution never fails.

use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

/// Default dial target for the notification service.
pub const DEFAULT_TARGET: &str = "unix:///run/jfsnotify/jfsnotify.sock";

/// Environment variable to override the dial target.
pub const TARGET_ENV_VAR: &str = "JFSNOTIFY_TARGET";

/// Socket family to dial or listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
    Unix,
    Ipc,
}

impl Network {
    /// Name as used in target strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Unix => "unix",
            Self::Ipc => "ipc",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved network family and address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DialTarget {
    pub network: Network,
    pub address: String,
}

impl DialTarget {
    #[must_use]
    pub fn new(network: Network, address: impl Into<String>) -> Self {
        Self {
            network,
            address: address.into(),
        }
    }

    /// Whether the address is a local socket path or name rather than host:port.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.network, Network::Unix | Network::Ipc)
    }
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.address)
    }
}

/// Resolve a target string into a network family and address.
#[must_use]
pub fn resolve(target: &str) -> DialTarget {
    let colon = target.find(':');
    let scheme = target.find(":/");

    // `unix:path` is not URL syntax, handle it before URL parsing.
    if let (Some(colon), None) = (colon, scheme) {
        if &target[..colon] == "unix" {
            return DialTarget::new(Network::Unix, &target[colon + 1..]);
        }
    }

    if let (Some(colon), Some(_)) = (colon, scheme) {
        let Ok(url) = Url::parse(target) else {
            return DialTarget::new(Network::Tcp, target);
        };

        let network = match url.scheme() {
            "unix" => Network::Unix,
            "ipc" => Network::Ipc,
            _ => return DialTarget::new(Network::Tcp, target),
        };

        return DialTarget::new(network, local_address(&target[colon + 1..]));
    }

    DialTarget::new(Network::Tcp, target)
}

/// Address part of a `unix:`/`ipc:` URL, given the text after the scheme.
///
/// Path and host are taken from the target as written (no dot-segment
/// removal), then percent-decoded. The path wins when present; otherwise the
/// host with its port. Opaque forms such as `unix:sock:/x` have neither and
/// yield an empty address.
fn local_address(rest: &str) -> String {
    let rest = rest.split(['#', '?']).next().unwrap_or_default();

    let (host, path) = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            let end = authority_and_path.find('/').unwrap_or(authority_and_path.len());
            let (authority, path) = authority_and_path.split_at(end);
            let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
            (host, path)
        }
        None if rest.starts_with('/') => ("", rest),
        None => ("", ""),
    };

    let raw = if path.is_empty() { host } else { path };
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Get the dial target to use when none is configured.
///
/// Resolution order:
/// 1. `JFSNOTIFY_TARGET` environment variable
/// 2. `unix://$XDG_RUNTIME_DIR/jfsnotify.sock` (if XDG_RUNTIME_DIR is set)
/// 3. Default: `unix:///run/jfsnotify/jfsnotify.sock`
#[must_use]
pub fn default_target() -> String {
    if let Ok(target) = std::env::var(TARGET_ENV_VAR) {
        return target;
    }

    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("unix://{}/jfsnotify.sock", runtime_dir.trim_end_matches('/'));
    }

    DEFAULT_TARGET.to_string()
}
