//! Connections to the notification service.
//!
//! Opens a stream for a resolved [`DialTarget`]: TCP for `tcp`, a Unix domain
//! socket for `unix` and `ipc`.

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use jfsnotify_protocol::{DialTarget, Network};
use std::time::Duration;
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

/// An open stream to the service
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    /// Human-readable description of the peer
    pub fn peer(&self) -> String {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            #[cfg(unix)]
            Self::Unix(stream) => stream
                .peer_addr()
                .ok()
                .and_then(|a| a.as_pathname().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "unnamed".to_string()),
        }
    }
}

/// Connect to a resolved target
pub async fn connect(target: &DialTarget) -> std::io::Result<Connection> {
    match target.network {
        Network::Tcp => Ok(Connection::Tcp(TcpStream::connect(target.address.as_str()).await?)),
        #[cfg(unix)]
        Network::Unix | Network::Ipc => {
            Ok(Connection::Unix(UnixStream::connect(&target.address).await?))
        }
        #[cfg(not(unix))]
        Network::Unix | Network::Ipc => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "local sockets are only supported on Unix systems",
        )),
    }
}

/// Connect to a resolved target, giving up after `timeout`
pub async fn connect_timeout(target: &DialTarget, timeout: Duration) -> Result<Connection> {
    match tokio::time::timeout(timeout, connect(target)).await {
        Ok(result) => result.wrap_err_with(|| format!("failed to connect to {target}")),
        Err(_) => Err(eyre!(
            "timed out after {}ms connecting to {target}",
            timeout.as_millis()
        )),
    }
}

/// Check that the service at `target` accepts connections
pub async fn probe(target: &DialTarget, timeout: Duration) -> Result<String> {
    if target.address.is_empty() {
        bail!("target {target} has an empty address");
    }

    let conn = connect_timeout(target, timeout).await?;
    let peer = conn.peer();
    tracing::debug!(network = %target.network, peer = %peer, "Probe connected");
    Ok(peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jfsnotify_protocol::resolve;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_probe_tcp_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let target = resolve(&addr.to_string());
        assert_eq!(target.network, Network::Tcp);

        let peer = probe(&target, TIMEOUT).await.unwrap();
        assert_eq!(peer, addr.to_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_unix_listener() {
        let path = std::env::temp_dir().join(format!("jfsnotify-probe-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let _listener = tokio::net::UnixListener::bind(&path).unwrap();

        let target = resolve(&format!("unix:{}", path.display()));
        assert_eq!(target.network, Network::Unix);
        assert!(probe(&target, TIMEOUT).await.is_ok());

        let target = resolve(&format!("ipc://{}", path.display()));
        assert_eq!(target.network, Network::Ipc);
        assert!(probe(&target, TIMEOUT).await.is_ok());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_probe_nonexistent_socket() {
        let target = resolve("unix:/nonexistent/jfsnotify.sock");
        assert!(probe(&target, TIMEOUT).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_empty_address() {
        let target = resolve("unix:");
        assert!(probe(&target, TIMEOUT).await.is_err());
    }
}
