use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// One unauthenticated GET returning a JSON document
///
/// The seam between the fetchers and the network; tests script it in memory.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;
}

/// reqwest-backed transport against the explorer API
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the base ends in '/'
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            base,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::Network(format!("bad url for {path}: {e}")))?;

        log::debug!("GET {url}");

        let res = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|_| TransportError::Body(body))
    }
}

/// Percent-encode a route key for use as a single path segment
pub fn path_segment(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let t = HttpTransport::new("http://localhost:5000/api", 1000).unwrap();
        assert_eq!(t.base_url().as_str(), "http://localhost:5000/api/");
        assert_eq!(
            t.base_url().join("blocks").unwrap().as_str(),
            "http://localhost:5000/api/blocks"
        );
    }

    #[test]
    fn rejects_garbage_base_url() {
        assert!(HttpTransport::new("not a url", 1000).is_err());
    }

    #[test]
    fn segments_are_escaped() {
        assert_eq!(path_segment("0xabc"), "0xabc");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
    }
}
