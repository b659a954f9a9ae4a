use std::time::Duration;

use futures_util::StreamExt;
use rosterwatch_logging::rw_debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{CategoryMap, FailureKind, SourceError};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base of the stats API, e.g. `http://localhost:8000/api/`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            max_bytes: 1024 * 1024,
        }
    }
}

/// Name lookup: `names?query=&limit=`.
#[async_trait::async_trait]
pub trait NameSource: Send + Sync {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError>;
}

/// Leader boards: `leaders`.
#[async_trait::async_trait]
pub trait LeaderSource: Send + Sync {
    async fn leaders(&self) -> Result<CategoryMap, SourceError>;
}

/// Recent trades: `trades?limit=`. Records are passed through untyped.
#[async_trait::async_trait]
pub trait TradeSource: Send + Sync {
    async fn trades(&self, limit: usize) -> Result<Vec<serde_json::Value>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct NamesResponse {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TradesResponse {
    trades: Vec<serde_json::Value>,
}

/// HTTP client for the stats API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, SourceError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SourceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|err| SourceError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        rw_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body)
            .map_err(|err| SourceError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl NameSource for ApiClient {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        let mut url = self.endpoint("names")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string());
        let response: NamesResponse = self.get_json(url).await?;
        Ok(response.names)
    }
}

#[async_trait::async_trait]
impl LeaderSource for ApiClient {
    async fn leaders(&self) -> Result<CategoryMap, SourceError> {
        let url = self.endpoint("leaders")?;
        self.get_json(url).await
    }
}

#[async_trait::async_trait]
impl TradeSource for ApiClient {
    async fn trades(&self, limit: usize) -> Result<Vec<serde_json::Value>, SourceError> {
        let mut url = self.endpoint("trades")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let response: TradesResponse = self.get_json(url).await?;
        Ok(response.trades)
    }
}

/// Parses the base URL, adding a trailing slash so relative joins keep
/// the last path segment.
fn parse_base_url(raw: &str) -> Result<Url, SourceError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|err| SourceError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

fn too_large(max_bytes: u64, actual: u64) -> SourceError {
    SourceError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::new(FailureKind::Timeout, err.to_string());
    }
    SourceError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_base_url;
    use crate::FailureKind;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(url.join("names").unwrap().path(), "/api/names");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = parse_base_url("ftp://example.com").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
        let err = parse_base_url("not a url").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
