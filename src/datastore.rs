//! Startup reachability check for the configured data store.
//!
//! Nothing routed uses the store yet; the server only refuses to start when
//! a store is configured but cannot be reached.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tokio::net::TcpStream;

/// How long the probe waits for a TCP connection.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DataStoreError {
    #[error("Invalid data store URL: {0}")]
    InvalidUrl(String),

    #[error("Data store URL has no port and scheme '{0}' has no known default")]
    UnknownPort(String),

    #[error("Cannot connect to data store at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out connecting to data store at {0}")]
    Timeout(String),
}

/// Default port for common data store schemes.
fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "mongodb" => Some(27017),
        "postgres" | "postgresql" => Some(5432),
        "mysql" => Some(3306),
        "redis" | "rediss" => Some(6379),
        _ => None,
    }
}

/// Resolve `host:port` from a connection string.
pub fn probe_address(url: &str) -> Result<String, DataStoreError> {
    let parsed = Url::parse(url).map_err(|e| DataStoreError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DataStoreError::InvalidUrl(format!("'{}' has no host", url)))?;
    let port = parsed
        .port()
        .or_else(|| default_port(parsed.scheme()))
        .or_else(|| parsed.port_or_known_default())
        .ok_or_else(|| DataStoreError::UnknownPort(parsed.scheme().to_string()))?;
    Ok(format!("{}:{}", host, port))
}

/// Open (and immediately drop) a TCP connection to the store.
pub async fn probe(url: &str, timeout: Duration) -> Result<String, DataStoreError> {
    let addr = probe_address(url)?;
    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(_stream)) => Ok(addr),
        Ok(Err(source)) => Err(DataStoreError::Unreachable { addr, source }),
        Err(_) => Err(DataStoreError::Timeout(addr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_address_uses_scheme_default_ports() {
        assert_eq!(
            probe_address("mongodb://localhost/myapp").unwrap(),
            "localhost:27017"
        );
        assert_eq!(
            probe_address("postgres://user:pw@db.internal/app").unwrap(),
            "db.internal:5432"
        );
        assert_eq!(
            probe_address("mongodb://localhost:27018/myapp").unwrap(),
            "localhost:27018"
        );
    }

    #[test]
    fn test_probe_address_rejects_bad_urls() {
        assert!(matches!(
            probe_address("not a url"),
            Err(DataStoreError::InvalidUrl(_))
        ));
        assert!(matches!(
            probe_address("custom://host/db"),
            Err(DataStoreError::UnknownPort(ref s)) if s == "custom"
        ));
    }

    #[tokio::test]
    async fn test_probe_succeeds_against_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("mongodb://127.0.0.1:{}/myapp", port);

        let addr = probe(&url, PROBE_TIMEOUT).await.unwrap();
        assert_eq!(addr, format!("127.0.0.1:{}", port));
    }

    #[tokio::test]
    async fn test_probe_fails_when_nothing_listens() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = probe(&format!("postgres://127.0.0.1:{}/app", port), PROBE_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, DataStoreError::Unreachable { .. }));
    }
}
