use std::fmt;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Url;
use tracing::{debug, info, warn};

use super::{AssetCacheError, AssetStore};
use crate::transport::{
    self, has_origin, same_origin, AssetResponse, CacheMode, Transport, TransportError,
};

/// Store name used unless configured otherwise. Changing it is the only way
/// to start over with a fresh store.
pub const DEFAULT_CACHE_NAME: &str = "idlerush-v1";

/// Assets stored eagerly at install time.
pub const DEFAULT_CORE_ASSETS: [&str; 5] = [
    "/",
    "/index.html",
    "/assets/styles.css",
    "/assets/app.js",
    "/games/games.json",
];

/// Lifecycle of one asset cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifecycle {
    /// Core assets not stored yet; requests pass through.
    Installing,
    /// Core assets stored; waiting to take control.
    Activating,
    /// Intercepting same-origin requests.
    Active,
    /// Installation failed; requests pass through for good.
    Redundant,
}

impl fmt::Display for CacheLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheLifecycle::Installing => write!(f, "installing"),
            CacheLifecycle::Activating => write!(f, "activating"),
            CacheLifecycle::Active => write!(f, "active"),
            CacheLifecycle::Redundant => write!(f, "redundant"),
        }
    }
}

/// Cache-first interceptor in front of another transport.
#[derive(Clone)]
pub struct AssetCache<T> {
    inner: T,
    origin: Url,
    store: AssetStore,
    state: CacheLifecycle,
}

impl<T: Transport> AssetCache<T> {
    pub fn new(inner: T, origin: Url, store: AssetStore) -> Self {
        Self {
            inner,
            origin,
            store,
            state: CacheLifecycle::Installing,
        }
    }

    /// Install (or resume) and activate in one go.
    ///
    /// Sites without a tuple origin (local `file:` sites) are refused before
    /// the store is touched; nothing could ever match them.
    pub async fn start(
        inner: T,
        origin: Url,
        store: AssetStore,
        core_assets: &[String],
    ) -> Result<Self, AssetCacheError> {
        if !has_origin(&origin) {
            return Err(AssetCacheError::NoOrigin {
                url: origin.to_string(),
            });
        }
        let mut cache = Self::new(inner, origin, store);
        if !cache.resume(core_assets).await? {
            cache.install(core_assets).await?;
            cache.activate()?;
        }
        Ok(cache)
    }

    pub fn state(&self) -> CacheLifecycle {
        self.state
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Take over a store that was installed earlier with the same core
    /// assets, skipping the install fetches. Returns whether it did.
    pub async fn resume(&mut self, core_assets: &[String]) -> Result<bool, AssetCacheError> {
        if self.state != CacheLifecycle::Installing {
            return Err(AssetCacheError::Lifecycle {
                action: "resume",
                state: self.state,
            });
        }

        match self.store.install_record().await? {
            Some(record) if record.data.core_assets == core_assets => {
                info!(cache = %self.store.name(), installed = %record.age_display(), "Resuming installed asset cache");
                self.state = CacheLifecycle::Active;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Fetch every core asset and store them all, or store nothing.
    pub async fn install(&mut self, core_assets: &[String]) -> Result<usize, AssetCacheError> {
        if self.state != CacheLifecycle::Installing {
            return Err(AssetCacheError::Lifecycle {
                action: "install",
                state: self.state,
            });
        }
        if !has_origin(&self.origin) {
            self.state = CacheLifecycle::Redundant;
            return Err(AssetCacheError::NoOrigin {
                url: self.origin.to_string(),
            });
        }
        info!(cache = %self.store.name(), assets = core_assets.len(), "Installing asset cache");

        let result = match self.fetch_core_assets(core_assets).await {
            Ok(responses) => self.store_core_assets(core_assets, &responses).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(count) => {
                self.state = CacheLifecycle::Activating;
                Ok(count)
            }
            Err(e) => {
                warn!(cache = %self.store.name(), error = %e, "Asset cache install failed");
                self.state = CacheLifecycle::Redundant;
                Err(e)
            }
        }
    }

    /// Write the fetched core assets and the install record. On any failure
    /// the entries written so far are removed again.
    async fn store_core_assets(
        &self,
        core_assets: &[String],
        responses: &[(Url, AssetResponse)],
    ) -> Result<usize, AssetCacheError> {
        let mut written: Vec<&Url> = Vec::with_capacity(responses.len());
        let mut outcome = Ok(());
        for (url, response) in responses {
            // A failed put may still have left its body behind
            written.push(url);
            if let Err(e) = self.store.put(url, response).await {
                outcome = Err(e);
                break;
            }
        }
        if outcome.is_ok() {
            outcome = self.store.write_install_record(core_assets).await;
        }

        match outcome {
            Ok(()) => Ok(responses.len()),
            Err(e) => {
                for url in written {
                    if let Err(cleanup) = self.store.remove(url).await {
                        warn!(url = %url, error = %cleanup, "Failed to roll back cached asset");
                    }
                }
                if let Err(cleanup) = self.store.remove_install_record().await {
                    warn!(error = %cleanup, "Failed to roll back install record");
                }
                Err(e)
            }
        }
    }

    async fn fetch_core_assets(
        &self,
        core_assets: &[String],
    ) -> Result<Vec<(Url, AssetResponse)>, AssetCacheError> {
        let urls = core_assets
            .iter()
            .map(|path| transport::resolve(&self.origin, path))
            .collect::<Result<Vec<_>, _>>()?;

        let inner = &self.inner;
        try_join_all(urls.into_iter().map(|url| async move {
            let response = inner.fetch(&url, CacheMode::Default).await?;
            if !response.is_success() {
                return Err(AssetCacheError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok::<_, AssetCacheError>((url, response))
        }))
        .await
    }

    /// Start intercepting immediately, without waiting for a restart.
    /// Older stores are left alone.
    pub fn activate(&mut self) -> Result<(), AssetCacheError> {
        if self.state != CacheLifecycle::Activating {
            return Err(AssetCacheError::Lifecycle {
                action: "activate",
                state: self.state,
            });
        }
        self.state = CacheLifecycle::Active;
        info!(cache = %self.store.name(), origin = %self.origin, "Asset cache active");
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Transport for AssetCache<T> {
    async fn fetch(&self, url: &Url, mode: CacheMode) -> Result<AssetResponse, TransportError> {
        if self.state != CacheLifecycle::Active || !same_origin(url, &self.origin) {
            return self.inner.fetch(url, mode).await;
        }

        match self.store.match_url(url).await {
            Ok(Some(hit)) => {
                debug!(url = %url, "Asset cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(url = %url, error = %e, "Asset cache read failed, using network"),
        }

        // Failures here go back to the caller untouched
        let response = self.inner.fetch(url, mode).await?;
        if let Err(e) = self.store.put(url, &response).await {
            warn!(url = %url, error = %e, "Failed to store asset");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const ORIGIN: &str = "https://games.example/";

    /// Serves `body of <url>` for every URL, except the ones marked missing
    /// (404) or unreachable (transport error). Counts network calls per URL.
    #[derive(Clone, Default)]
    struct CountingTransport {
        missing: HashSet<String>,
        unreachable: HashSet<String>,
        calls: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl CountingTransport {
        fn calls(&self, url: &str) -> usize {
            self.calls.lock().expect("lock").get(url).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().expect("lock").values().sum()
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn fetch(&self, url: &Url, _mode: CacheMode) -> Result<AssetResponse, TransportError> {
            *self
                .calls
                .lock()
                .expect("lock")
                .entry(url.to_string())
                .or_default() += 1;
            if self.unreachable.contains(url.as_str()) {
                return Err(TransportError::InvalidUrl(format!("unreachable: {}", url)));
            }
            let status = if self.missing.contains(url.as_str()) { 404 } else { 200 };
            Ok(AssetResponse {
                url: url.to_string(),
                status,
                content_type: Some("text/plain".to_string()),
                body: format!("body of {}", url).into_bytes(),
            })
        }
    }

    fn core_assets() -> Vec<String> {
        DEFAULT_CORE_ASSETS.iter().map(|s| s.to_string()).collect()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    async fn open_store(dir: &TempDir) -> AssetStore {
        AssetStore::open(dir.path(), DEFAULT_CACHE_NAME).await.expect("open store")
    }

    #[tokio::test]
    async fn test_core_asset_served_from_cache() {
        let dir = TempDir::new().expect("tempdir");
        let network = CountingTransport::default();
        let cache = AssetCache::start(network.clone(), url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("start");
        assert_eq!(cache.state(), CacheLifecycle::Active);

        let index = url("https://games.example/index.html");
        assert_eq!(network.calls(index.as_str()), 1);

        let first = cache.fetch(&index, CacheMode::Default).await.expect("first");
        let second = cache.fetch(&index, CacheMode::Default).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(first.text(), "body of https://games.example/index.html");
        // Only the install fetch ever reached the network
        assert_eq!(network.calls(index.as_str()), 1);
    }

    #[tokio::test]
    async fn test_install_failure_stores_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut network = CountingTransport::default();
        network
            .missing
            .insert("https://games.example/assets/styles.css".to_string());

        let mut cache = AssetCache::new(network.clone(), url(ORIGIN), open_store(&dir).await);
        let err = cache.install(&core_assets()).await.unwrap_err();
        assert!(matches!(err, AssetCacheError::BadStatus { status: 404, .. }));
        assert_eq!(cache.state(), CacheLifecycle::Redundant);

        let stats = cache.store().stats().await.expect("stats");
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.installed, None);

        // A redundant cache never intercepts
        let index = url("https://games.example/index.html");
        let before = network.calls(index.as_str());
        cache.fetch(&index, CacheMode::Default).await.expect("pass through");
        cache.fetch(&index, CacheMode::Default).await.expect("pass through");
        assert_eq!(network.calls(index.as_str()), before + 2);
    }

    #[tokio::test]
    async fn test_install_transport_failure_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let mut network = CountingTransport::default();
        network
            .unreachable
            .insert("https://games.example/games/games.json".to_string());

        let result = AssetCache::start(network, url(ORIGIN), open_store(&dir).await, &core_assets()).await;
        assert!(matches!(result, Err(AssetCacheError::Transport(_))));
    }

    #[tokio::test]
    async fn test_miss_populates_store() {
        let dir = TempDir::new().expect("tempdir");
        let network = CountingTransport::default();
        let cache = AssetCache::start(network.clone(), url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("start");

        let game = url("https://games.example/games/orbit/index.html");
        let first = cache.fetch(&game, CacheMode::Default).await.expect("miss");
        let second = cache.fetch(&game, CacheMode::Default).await.expect("hit");
        assert_eq!(first, second);
        assert_eq!(network.calls(game.as_str()), 1);
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through() {
        let dir = TempDir::new().expect("tempdir");
        let network = CountingTransport::default();
        let cache = AssetCache::start(network.clone(), url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("start");
        let before = cache.store().stats().await.expect("stats").entries;

        let thumb = url("https://dummyimage.com/640x360/0b1026/ffffff&text=Zeta");
        cache.fetch(&thumb, CacheMode::Default).await.expect("first");
        cache.fetch(&thumb, CacheMode::Default).await.expect("second");
        assert_eq!(network.calls(thumb.as_str()), 2);
        assert_eq!(cache.store().stats().await.expect("stats").entries, before);
    }

    #[tokio::test]
    async fn test_miss_failure_propagates() {
        let dir = TempDir::new().expect("tempdir");
        let mut network = CountingTransport::default();
        let broken = "https://games.example/games/broken.json";
        network.unreachable.insert(broken.to_string());
        let cache = AssetCache::start(network, url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("start");

        let err = cache.fetch(&url(broken), CacheMode::NoStore).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_not_intercepting_before_activation() {
        let dir = TempDir::new().expect("tempdir");
        let network = CountingTransport::default();
        let mut cache = AssetCache::new(network.clone(), url(ORIGIN), open_store(&dir).await);
        cache.install(&core_assets()).await.expect("install");
        assert_eq!(cache.state(), CacheLifecycle::Activating);

        let index = url("https://games.example/index.html");
        cache.fetch(&index, CacheMode::Default).await.expect("pass through");
        assert_eq!(network.calls(index.as_str()), 2);

        cache.activate().expect("activate");
        cache.fetch(&index, CacheMode::Default).await.expect("hit");
        assert_eq!(network.calls(index.as_str()), 2);
    }

    #[tokio::test]
    async fn test_resume_skips_install() {
        let dir = TempDir::new().expect("tempdir");
        let first_run = CountingTransport::default();
        AssetCache::start(first_run.clone(), url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("first start");
        assert_eq!(first_run.total_calls(), DEFAULT_CORE_ASSETS.len());

        let second_run = CountingTransport::default();
        let cache = AssetCache::start(second_run.clone(), url(ORIGIN), open_store(&dir).await, &core_assets())
            .await
            .expect("second start");
        assert_eq!(cache.state(), CacheLifecycle::Active);
        assert_eq!(second_run.total_calls(), 0);

        // A different core list means a fresh install
        let mut fewer = core_assets();
        fewer.pop();
        let third_run = CountingTransport::default();
        AssetCache::start(third_run.clone(), url(ORIGIN), open_store(&dir).await, &fewer)
            .await
            .expect("third start");
        assert_eq!(third_run.total_calls(), fewer.len());
    }

    #[tokio::test]
    async fn test_failed_put_rolls_back_install() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir).await;
        // A directory where the body file should go makes that put fail
        let app_js = url("https://games.example/assets/app.js");
        std::fs::create_dir(store.dir().join(format!("{}.body", AssetStore::key(&app_js))))
            .expect("blocking dir");

        let mut cache = AssetCache::new(CountingTransport::default(), url(ORIGIN), store);
        let err = cache.install(&core_assets()).await.unwrap_err();
        assert!(matches!(err, AssetCacheError::Io { .. }));
        assert_eq!(cache.state(), CacheLifecycle::Redundant);

        for path in DEFAULT_CORE_ASSETS {
            let asset = transport::resolve(&url(ORIGIN), path).expect("resolve");
            assert!(
                cache.store().match_url(&asset).await.expect("match").is_none(),
                "{} should have been rolled back",
                path
            );
        }
        assert!(cache.store().install_record().await.expect("record").is_none());
    }

    #[tokio::test]
    async fn test_local_site_is_never_cached() {
        let site = TempDir::new().expect("site");
        let index = site.path().join("index.html");
        std::fs::write(&index, "Old").expect("write index");
        let origin = Url::from_directory_path(site.path()).expect("dir url");
        let page = transport::resolve(&origin, "/index.html").expect("resolve");

        let dir = TempDir::new().expect("tempdir");
        let http = crate::transport::HttpTransport::new().expect("http");
        let result = AssetCache::start(http.clone(), origin.clone(), open_store(&dir).await, &core_assets()).await;
        assert!(matches!(result, Err(AssetCacheError::NoOrigin { .. })));

        // Even a store left installed by an earlier run is not resumed
        let store = open_store(&dir).await;
        store.write_install_record(&core_assets()).await.expect("record");
        let result = AssetCache::start(http.clone(), origin.clone(), store.clone(), &core_assets()).await;
        assert!(matches!(result, Err(AssetCacheError::NoOrigin { .. })));

        let mut cache = AssetCache::new(http, origin, store);
        assert!(matches!(
            cache.install(&core_assets()).await,
            Err(AssetCacheError::NoOrigin { .. })
        ));
        assert_eq!(cache.state(), CacheLifecycle::Redundant);
        assert_eq!(cache.store().stats().await.expect("stats").entries, 0);

        // Edits on disk show up on the next request
        std::fs::write(&index, "New").expect("rewrite index");
        let response = cache.fetch(&page, CacheMode::Default).await.expect("fetch");
        assert_eq!(response.text(), "New");
    }

    #[tokio::test]
    async fn test_lifecycle_order_enforced() {
        let dir = TempDir::new().expect("tempdir");
        let mut cache = AssetCache::new(CountingTransport::default(), url(ORIGIN), open_store(&dir).await);
        let err = cache.activate().unwrap_err();
        assert!(matches!(
            err,
            AssetCacheError::Lifecycle { action: "activate", state: CacheLifecycle::Installing }
        ));
    }
}
