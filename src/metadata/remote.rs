//! Best-effort remote stream fetching.
//!
//! Non-local locators are downloaded into memory and parsed from there. At
//! most `max_bytes` are read, so long files and endless streams are parsed
//! from their prefix. There is no authentication or custom header support.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};

/// Fetches the bytes behind a remote locator.
///
/// Implement this trait to substitute the network in tests.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    http_client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            max_bytes: usize::try_from(config.max_bytes).unwrap_or(usize::MAX),
        })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let scheme = url.split_once(':').map(|(s, _)| s.to_ascii_lowercase());
        if !matches!(scheme.as_deref(), Some("http" | "https")) {
            return Err(Error::UnsupportedScheme {
                operation: "remote fetch",
                locator: url.to_string(),
            });
        }

        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::remote(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote(
                url,
                format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::remote(url, e.to_string()))?
        {
            if append_capped(&mut body, &chunk, self.max_bytes) {
                debug!(target: "media_bridge::metadata::remote", url, limit = self.max_bytes, "Remote stream truncated");
                break;
            }
        }
        debug!(target: "media_bridge::metadata::remote", url, len = body.len(), "Fetched remote stream");
        Ok(body)
    }
}

/// Append as much of `chunk` as fits under `limit`. Returns true once the
/// buffer is full.
fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() >= limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP response whose body never ends.
    async fn serve_endless_stream() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = b"HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nConnection: close\r\n\r\n";
            if socket.write_all(head).await.is_err() {
                return;
            }
            let chunk = [0u8; 4096];
            while socket.write_all(&chunk).await.is_ok() {}
        });
        format!("http://{addr}/radio")
    }

    #[test]
    fn test_append_capped() {
        let mut buf = Vec::new();
        assert!(!append_capped(&mut buf, b"abc", 5));
        assert!(append_capped(&mut buf, b"defg", 5));
        assert_eq!(buf, b"abcde");
        assert!(append_capped(&mut buf, b"h", 5));
        assert_eq!(buf.len(), 5);
    }

    #[tokio::test]
    async fn test_endless_stream_is_read_up_to_limit() {
        let url = serve_endless_stream().await;
        let config = RemoteConfig {
            max_bytes: 10_000,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        let body = tokio::time::timeout(Duration::from_secs(10), fetcher.fetch(&url))
            .await
            .expect("fetch should stop at the limit")
            .unwrap();
        assert_eq!(body.len(), 10_000);
    }

    #[test]
    fn test_http_fetcher_builds_from_default_config() {
        assert!(HttpFetcher::new(&RemoteConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_scheme_fails() {
        let fetcher = HttpFetcher::new(&RemoteConfig::default()).unwrap();
        let result = fetcher.fetch("rtsp://camera.local/stream").await;
        assert!(matches!(result, Err(Error::UnsupportedScheme { .. })));
    }
}
