//! Transport backed by reqwest for hosted sites and the filesystem for
//! local ones.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use tracing::debug;

use super::{AssetResponse, CacheMode, Transport, TransportError};

/// HTTP request timeout in seconds.
/// 30s allows for slow hosts while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Served in place of a directory, the way a static host serves `/`.
const DIRECTORY_INDEX: &str = "index.html";

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("launchpad/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError> {
        let mut request = self.client.get(url.clone());
        if mode == CacheMode::NoStore {
            request = request
                .header(header::CACHE_CONTROL, "no-store, no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status, bytes = body.len(), "HTTP fetch complete");
        Ok(AssetResponse {
            url: url.to_string(),
            status,
            content_type,
            body,
        })
    }

    async fn fetch_file(&self, url: &Url) -> Result<AssetResponse, TransportError> {
        let mut path = url
            .to_file_path()
            .map_err(|_| TransportError::InvalidUrl(url.to_string()))?;
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir || url.path().ends_with('/') {
            path = path.join(DIRECTORY_INDEX);
        }

        match tokio::fs::read(&path).await {
            Ok(body) => {
                debug!(path = %path.display(), bytes = body.len(), "File fetch complete");
                Ok(AssetResponse {
                    url: url.to_string(),
                    status: 200,
                    content_type: guess_content_type(&path).map(str::to_string),
                    body,
                })
            }
            // A missing file behaves like a static host's 404
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(AssetResponse {
                url: url.to_string(),
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
            Err(source) => Err(TransportError::Io { path, source }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url, mode).await,
            "file" => self.fetch_file(url).await,
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "wasm" => "application/wasm",
        _ => return None,
    };
    Some(mime)
}
