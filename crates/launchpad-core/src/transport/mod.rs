//! Network transport for launcher assets.
//!
//! Both the manifest loader and the offline asset cache talk to the outside
//! world through the `Transport` trait. `HttpTransport` is the real
//! implementation (http, https and local `file://` sites); the asset cache
//! implements it too so it can sit in front of another transport.

pub mod error;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

pub use error::TransportError;
pub use http::HttpTransport;

/// Whether a request may be answered by intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Ask every intermediate cache to step aside (`Cache-Control: no-store`).
    NoStore,
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET for `url`. Non-success statuses are returned as
    /// responses; only failures to obtain any response are errors.
    async fn fetch(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError> {
        (**self).fetch(url, mode).await
    }
}

/// Same scheme, host and port. Opaque origins (`file:`, `data:`) never
/// match anything, themselves included.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Whether `url` has a tuple origin that same-origin checks can match.
pub fn has_origin(url: &Url) -> bool {
    url.origin().is_tuple()
}

/// Resolve a site path against the base.
///
/// For http(s) sites this is a normal URL join, so `/index.html` lands at the
/// origin root. A local site has no origin root, so root-relative paths are
/// taken relative to the base directory instead.
pub fn resolve(base: &Url, path: &str) -> Result<Url, TransportError> {
    let joined = if base.scheme() == "file" {
        base.join(path.trim_start_matches('/'))
    } else {
        base.join(path)
    };
    joined.map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
}
