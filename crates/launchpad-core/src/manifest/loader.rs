use std::path::PathBuf;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{extract_inline_manifest, ManifestError};
use crate::models::Game;
use crate::transport::{self, CacheMode, Transport};
use crate::view::GameStore;

/// Well-known location of the remote manifest, relative to the base.
pub const MANIFEST_PATH: &str = "games/games.json";

/// How the inline source is named in error panels.
pub const INLINE_SOURCE: &str = "inline manifest";

/// Where the manifest text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// Embedded manifest text; authoritative when present.
    Inline(String),
    /// Fallback fetched over the transport.
    Remote(Url),
}

/// Loads the game list once, trying the inline source before the network.
pub struct ManifestLoader<T> {
    transport: T,
    base: Url,
    inline_file: Option<PathBuf>,
}

impl<T: Transport> ManifestLoader<T> {
    pub fn new(transport: T, base: Url) -> Self {
        Self {
            transport,
            base,
            inline_file: None,
        }
    }

    /// Use a manifest file on disk as the inline source instead of looking
    /// for one in the hosting page.
    pub fn with_inline_file(mut self, path: PathBuf) -> Self {
        self.inline_file = Some(path);
        self
    }

    /// Load the manifest from the first available source.
    pub async fn load(&self) -> Result<GameStore, ManifestError> {
        let source = self.discover_source().await?;
        let games = self.load_source(&source).await?;
        info!(count = games.len(), "Manifest loaded");
        Ok(GameStore::new(games))
    }

    /// Find the inline manifest if there is one, otherwise name the remote.
    pub async fn discover_source(&self) -> Result<ManifestSource, ManifestError> {
        if let Some(ref path) = self.inline_file {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ManifestError::Io {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "Using inline manifest file");
            return Ok(ManifestSource::Inline(text));
        }

        // No hosting page, or a page without the element, means no inline source
        match self.transport.fetch(&self.base, CacheMode::Default).await {
            Ok(page) if page.is_success() => {
                if let Some(text) = extract_inline_manifest(&page.text()) {
                    debug!(page = %self.base, "Found inline manifest in hosting page");
                    return Ok(ManifestSource::Inline(text));
                }
            }
            Ok(page) => {
                debug!(page = %self.base, status = page.status, "Hosting page unavailable");
            }
            Err(e) => {
                debug!(page = %self.base, error = %e, "Hosting page unavailable");
            }
        }

        let url = transport::resolve(&self.base, MANIFEST_PATH).map_err(|source| {
            ManifestError::Network {
                path: MANIFEST_PATH.to_string(),
                source,
            }
        })?;
        Ok(ManifestSource::Remote(url))
    }

    pub async fn load_source(&self, source: &ManifestSource) -> Result<Vec<Game>, ManifestError> {
        match source {
            ManifestSource::Inline(text) => parse_inline(text),
            ManifestSource::Remote(url) => self.fetch_remote(url).await,
        }
    }

    async fn fetch_remote(&self, url: &Url) -> Result<Vec<Game>, ManifestError> {
        let path = MANIFEST_PATH.to_string();

        let response = self
            .transport
            .fetch(url, CacheMode::NoStore)
            .await
            .map_err(|source| {
                warn!(url = %url, error = %source, "Manifest fetch failed");
                ManifestError::Network {
                    path: path.clone(),
                    source,
                }
            })?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Manifest fetch returned error status");
            return Err(ManifestError::Http {
                path,
                status: response.status,
            });
        }

        let value: Value = serde_json::from_slice(&response.body).map_err(|source| {
            ManifestError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        decode_games(value, path)
    }
}

/// Only text that is not JSON at all gets the fixed invalid-JSON message.
fn parse_inline(text: &str) -> Result<Vec<Game>, ManifestError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "Inline manifest JSON error");
        ManifestError::InvalidInline(e)
    })?;
    decode_games(value, INLINE_SOURCE.to_string())
}

fn decode_games(value: Value, path: String) -> Result<Vec<Game>, ManifestError> {
    if !value.is_array() {
        warn!(source = %path, "Manifest is not an array");
        return Err(ManifestError::NotAnArray { path });
    }
    serde_json::from_value(value).map_err(|source| {
        warn!(source = %path, error = %source, "Manifest record rejected");
        ManifestError::Parse { path, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{AssetResponse, TransportError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned responses and records every request.
    #[derive(Default)]
    struct StubTransport {
        responses: HashMap<String, (u16, String)>,
        requests: Mutex<Vec<(String, CacheMode)>>,
    }

    impl StubTransport {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.to_string()));
            self
        }

        fn requested(&self) -> Vec<(String, CacheMode)> {
            self.requests.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn fetch(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError> {
            self.requests
                .lock()
                .expect("lock")
                .push((url.to_string(), mode));
            match self.responses.get(url.as_str()) {
                Some((status, body)) => Ok(AssetResponse {
                    url: url.to_string(),
                    status: *status,
                    content_type: None,
                    body: body.as_bytes().to_vec(),
                }),
                None => Err(TransportError::InvalidUrl(format!("unreachable: {}", url))),
            }
        }
    }

    const BASE: &str = "https://games.example/";
    const REMOTE: &str = "https://games.example/games/games.json";

    fn base() -> Url {
        Url::parse(BASE).expect("base url")
    }

    fn page_with(manifest: &str) -> String {
        format!(
            r#"<html><body><main id="gamesGrid"></main>
               <script id="gamesManifest" type="application/json">{}</script></body></html>"#,
            manifest
        )
    }

    fn titles(store: &GameStore) -> Vec<&str> {
        store.games().iter().map(|g| g.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_inline_manifest_wins_without_network() {
        let transport = StubTransport::default()
            .with(BASE, 200, &page_with(r#"[{"id":"a","title":"Zeta"},{"id":"b","title":"Alpha"}]"#))
            .with(REMOTE, 500, "");
        let loader = ManifestLoader::new(transport, base());

        let store = loader.load().await.expect("inline manifest loads");
        assert_eq!(titles(&store), vec!["Zeta", "Alpha"]);

        let requested = loader.transport.requested();
        assert_eq!(requested.len(), 1);
        assert_eq!(requested[0].0, BASE);
    }

    #[tokio::test]
    async fn test_malformed_inline_halts_without_fallback() {
        let transport = StubTransport::default()
            .with(BASE, 200, &page_with("[{\"id\":\"a\",\"title\":"))
            .with(REMOTE, 200, r#"[{"id":"r","title":"Remote"}]"#);
        let loader = ManifestLoader::new(transport, base());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::InvalidInline(_)));
        assert_eq!(err.panel().message, "Inline manifest is invalid JSON.");
        assert!(loader
            .transport
            .requested()
            .iter()
            .all(|(url, _)| url != REMOTE));
    }

    #[tokio::test]
    async fn test_inline_loose_types_still_load() {
        let transport = StubTransport::default().with(
            BASE,
            200,
            &page_with(r#"[{"id":1,"title":"Alpha","path":"a/","plays":"1200"}]"#),
        );
        let loader = ManifestLoader::new(transport, base());

        let store = loader.load().await.expect("valid JSON with loose types loads");
        assert_eq!(titles(&store), vec!["Alpha"]);
        assert_eq!(store.games()[0].id, "1");
        assert_eq!(store.games()[0].plays(), 1200.0);
    }

    #[tokio::test]
    async fn test_inline_valid_json_errors_are_not_invalid_json() {
        let not_a_list = StubTransport::default().with(BASE, 200, &page_with(r#"{"games":[]}"#));
        let err = ManifestLoader::new(not_a_list, base()).load().await.unwrap_err();
        assert!(matches!(err, ManifestError::NotAnArray { .. }));
        assert_eq!(err.panel().message, "Couldn't load inline manifest: Manifest is not an array");

        let untitled = StubTransport::default().with(BASE, 200, &page_with(r#"[{"id":"a"}]"#));
        let err = ManifestLoader::new(untitled, base()).load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert_ne!(err.panel().message, "Inline manifest is invalid JSON.");
        assert_eq!(err.attempted(), "inline manifest");
    }

    #[tokio::test]
    async fn test_remote_fallback_bypasses_cache() {
        let transport = StubTransport::default()
            .with(BASE, 200, "<html><body>no manifest here</body></html>")
            .with(REMOTE, 200, r#"[{"id":"r","title":"Remote","path":"games/r/"}]"#);
        let loader = ManifestLoader::new(transport, base());

        let store = loader.load().await.expect("remote manifest loads");
        assert_eq!(titles(&store), vec!["Remote"]);

        let requested = loader.transport.requested();
        assert_eq!(requested.last(), Some(&(REMOTE.to_string(), CacheMode::NoStore)));
    }

    #[tokio::test]
    async fn test_remote_http_404() {
        let transport = StubTransport::default().with(REMOTE, 404, "Not Found");
        let loader = ManifestLoader::new(transport, base());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Http { status: 404, .. }));
        assert!(err.panel().message.contains("HTTP 404"));
        assert!(err.panel().message.contains("games/games.json"));
    }

    #[tokio::test]
    async fn test_remote_not_an_array() {
        let transport = StubTransport::default().with(REMOTE, 200, r#"{"not":"a list"}"#);
        let loader = ManifestLoader::new(transport, base());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::NotAnArray { .. }));
        assert!(err.panel().message.contains("Manifest is not an array"));
    }

    #[tokio::test]
    async fn test_remote_body_not_json() {
        let transport = StubTransport::default().with(REMOTE, 200, "<html>oops</html>");
        let loader = ManifestLoader::new(transport, base());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_remote_network_failure() {
        // Neither the page nor the manifest is reachable
        let loader = ManifestLoader::new(StubTransport::default(), base());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Network { .. }));
        assert_eq!(err.attempted(), "games/games.json");
    }

    #[tokio::test]
    async fn test_inline_file_overrides_page() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("games.json");
        std::fs::write(&path, r#"[{"id":"f","title":"From File"}]"#).expect("write");

        let transport = StubTransport::default().with(REMOTE, 200, "[]");
        let loader = ManifestLoader::new(transport, base()).with_inline_file(path);

        let store = loader.load().await.expect("file manifest loads");
        assert_eq!(titles(&store), vec!["From File"]);
        assert!(loader.transport.requested().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inline_file() {
        let dir = TempDir::new().expect("tempdir");
        let loader = ManifestLoader::new(StubTransport::default(), base())
            .with_inline_file(dir.path().join("absent.json"));

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
