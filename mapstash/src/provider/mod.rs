//! Remote tile source access.
//!
//! [`TileSource`] turns tile coordinates into request URLs from a templated
//! `{z}/{x}/{y}` pattern and carries the identifying header tile servers
//! require. [`AsyncHttpClient`] abstracts the HTTP transport so tests can
//! inject scripted clients instead of hitting the network.

use std::fmt;
use std::future::Future;

use tracing::{trace, warn};

use crate::coord::TileCoord;

/// Errors that can occur while fetching a tile from the remote source.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Request could not be sent or the response body could not be read
    Transport(String),
    /// Server answered with a non-200 status
    Status { status: u16, url: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "HTTP transport error: {}", msg),
            ProviderError::Status { status, url } => {
                write!(f, "HTTP {} from {}", status, url)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trait for asynchronous HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling scripted HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request with the given headers.
    ///
    /// # Returns
    ///
    /// The response body as bytes for an HTTP 200 answer; every other status
    /// and any transport failure is an error.
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the given request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ProviderError::Transport(format!("Request failed: {}", e)));
            }
        };

        // Only HTTP 200 counts as a tile; redirects are followed by reqwest,
        // anything else (204, 404, 503, ...) is a failed fetch
        if response.status() != reqwest::StatusCode::OK {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => Err(ProviderError::Transport(format!(
                "Failed to read response: {}",
                e
            ))),
        }
    }
}

/// A templated remote tile endpoint.
///
/// The template contains `{z}`, `{x}` and `{y}` placeholders, e.g.
/// `https://tile.openstreetmap.org/{z}/{x}/{y}.png`. Every request carries
/// the configured User-Agent; public tile servers reject anonymous clients.
#[derive(Debug, Clone)]
pub struct TileSource {
    url_template: String,
    user_agent: String,
}

impl TileSource {
    /// Create a tile source from a URL template and identifying User-Agent.
    pub fn new(url_template: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Builds the request URL for the given tile.
    pub fn url_for(&self, coord: &TileCoord) -> String {
        self.url_template
            .replace("{z}", &coord.zoom.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    /// Headers sent with every tile request.
    pub fn headers(&self) -> [(&str, &str); 1] {
        [("User-Agent", self.user_agent.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_template_substitutes_all_placeholders() {
        let source = TileSource::new(
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            "mapstash/0.1",
        );
        let coord = TileCoord {
            x: 19295,
            y: 24640,
            zoom: 16,
        };

        assert_eq!(
            source.url_for(&coord),
            "https://tile.openstreetmap.org/16/19295/24640.png"
        );
    }

    #[test]
    fn url_template_with_query_style_placeholders() {
        let source = TileSource::new("https://maps.example.com/vt?x={x}&y={y}&z={z}", "mapstash");
        let coord = TileCoord {
            x: 3,
            y: 7,
            zoom: 5,
        };

        assert_eq!(
            source.url_for(&coord),
            "https://maps.example.com/vt?x=3&y=7&z=5"
        );
    }

    #[test]
    fn headers_carry_user_agent() {
        let source = TileSource::new("https://t/{z}/{x}/{y}", "mapstash/0.1 test");
        assert_eq!(source.headers(), [("User-Agent", "mapstash/0.1 test")]);
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::Status {
            status: 404,
            url: "https://t/1/2/3".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://t/1/2/3");

        let err = ProviderError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
