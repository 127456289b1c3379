//! Application state management for Launchpad.
//!
//! This module contains the core `App` struct that owns the game store, the
//! view state (search text and sort mode), the current selection and the
//! detail overlay, and coordinates the background startup task that opens
//! the offline cache and loads the manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use launchpad_core::asset_cache::{AssetCache, AssetCacheError, AssetStore};
use launchpad_core::manifest::MANIFEST_PATH;
use launchpad_core::transport;
use launchpad_core::{
    build_view, DetailOverlay, ErrorPanel, GameCard, GameStore, HttpTransport, ManifestError,
    ManifestLoader, SortMode, Transport, TransportError, Url, ViewState,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::config::Config;
use crate::launch;
use crate::ui::layout;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Startup sends at most two messages (cache status, then the manifest).
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length of the search text.
const MAX_QUERY_LENGTH: usize = 64;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingDetails,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Progress of the one-shot manifest load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    /// The error panel replaces the grid for the rest of the session.
    Failed(ErrorPanel),
}

/// Everything resolved from config and command line before startup.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub base: Url,
    pub inline_manifest: Option<PathBuf>,
    pub offline_cache: bool,
    pub cache_root: PathBuf,
    pub cache_name: String,
    pub core_assets: Vec<String>,
    pub sort: SortMode,
    pub query: String,
}

impl LaunchSettings {
    /// Command-line flags win over the config file.
    pub fn resolve(config: &Config, args: &Args, cache_root: PathBuf) -> Result<Self> {
        Ok(Self {
            base: config.base_url(args.base.as_deref())?,
            inline_manifest: args.manifest.clone(),
            offline_cache: config.offline_cache && !args.no_offline_cache,
            cache_root,
            cache_name: config.cache_name.clone(),
            core_assets: config.core_assets.clone(),
            sort: args.sort.unwrap_or(config.default_sort),
            query: args.query.clone(),
        })
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Messages from the startup task back to the UI loop.
enum LoadResult {
    /// Offline cache is serving requests; carries a status line
    CacheReady(String),
    /// Offline cache could not start; requests go straight to the site
    CacheUnavailable(String),
    /// Local site: there is no origin for the offline cache to serve
    CacheSkipped,
    /// The one and only manifest load
    Manifest(Result<GameStore, ManifestError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub settings: LaunchSettings,

    // UI State
    pub state: AppState,
    pub load_status: LoadStatus,
    pub view: ViewState,
    pub selection: usize,
    /// First grid row on screen
    pub scroll_row: usize,
    /// At most one overlay; opening another replaces it.
    pub detail: Option<DetailOverlay>,
    /// Last frame area, for grid navigation and mouse hit testing
    pub viewport: Rect,

    // Data
    store: GameStore,
    cards: Vec<GameCard>,

    // Background task channel
    load_rx: Option<mpsc::Receiver<LoadResult>>,
    load_tx: mpsc::Sender<LoadResult>,

    // Status bar
    pub status_message: Option<String>,
    pub cache_status: Option<String>,
}

impl App {
    pub fn new(settings: LaunchSettings) -> Self {
        let (load_tx, load_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let view = ViewState::new(settings.query.clone(), settings.sort);
        let state = if view.query.is_empty() {
            AppState::Normal
        } else {
            AppState::Searching
        };

        Self {
            settings,
            state,
            load_status: LoadStatus::Loading,
            view,
            selection: 0,
            scroll_row: 0,
            detail: None,
            viewport: Rect::default(),
            store: GameStore::default(),
            cards: Vec::new(),
            load_rx: Some(load_rx),
            load_tx,
            status_message: None,
            cache_status: None,
        }
    }

    // ===== Startup =====

    /// Spawn the startup task: open the offline cache (if enabled), then load
    /// the manifest through it.
    pub fn start_loading(&mut self) {
        let tx = self.load_tx.clone();
        let settings = self.settings.clone();
        tokio::spawn(async move {
            Self::execute_startup(tx, settings).await;
        });
    }

    async fn send_result(tx: &mpsc::Sender<LoadResult>, result: LoadResult) {
        if tx.send(result).await.is_err() {
            debug!("UI loop gone, dropping startup result");
        }
    }

    async fn execute_startup(tx: mpsc::Sender<LoadResult>, settings: LaunchSettings) {
        let transport = match Self::connect(&tx, &settings).await {
            Ok(transport) => transport,
            Err(source) => {
                let err = ManifestError::Network {
                    path: MANIFEST_PATH.to_string(),
                    source,
                };
                Self::send_result(&tx, LoadResult::Manifest(Err(err))).await;
                return;
            }
        };

        let mut loader = ManifestLoader::new(transport, settings.base.clone());
        if let Some(path) = settings.inline_manifest.clone() {
            loader = loader.with_inline_file(path);
        }
        let result = loader.load().await;
        Self::send_result(&tx, LoadResult::Manifest(result)).await;
    }

    /// Pick the transport: the offline cache in front of HTTP, or plain HTTP
    /// when the cache is disabled or fails to start.
    async fn connect(
        tx: &mpsc::Sender<LoadResult>,
        settings: &LaunchSettings,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let http = HttpTransport::new()?;
        if !settings.offline_cache {
            debug!("Offline cache disabled");
            return Ok(Arc::new(http));
        }
        if !transport::has_origin(&settings.base) {
            info!(base = %settings.base, "Local site, reading files directly");
            Self::send_result(tx, LoadResult::CacheSkipped).await;
            return Ok(Arc::new(http));
        }

        match open_asset_cache(http.clone(), settings).await {
            Ok(cache) => {
                let summary = cache_summary(&cache).await;
                Self::send_result(tx, LoadResult::CacheReady(summary)).await;
                Ok(Arc::new(cache))
            }
            Err(e) => {
                warn!(error = %e, "Offline cache unavailable, using the network directly");
                Self::send_result(tx, LoadResult::CacheUnavailable(e.to_string())).await;
                Ok(Arc::new(http))
            }
        }
    }

    pub fn check_background_tasks(&mut self) {
        let results: Vec<LoadResult> = {
            if let Some(ref mut rx) = self.load_rx {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            } else {
                Vec::new()
            }
        };

        for result in results {
            self.process_load_result(result);
        }
    }

    fn process_load_result(&mut self, result: LoadResult) {
        match result {
            LoadResult::CacheReady(summary) => {
                self.cache_status = Some(summary);
            }
            LoadResult::CacheSkipped => {
                self.cache_status = Some("Offline cache off (local site)".to_string());
            }
            LoadResult::CacheUnavailable(error) => {
                self.cache_status = Some("Offline cache off".to_string());
                self.status_message = Some(format!("Offline cache unavailable: {}", error));
            }
            LoadResult::Manifest(result) => self.apply_manifest(result),
        }
    }

    /// The store is written exactly once; later results are ignored.
    pub(crate) fn apply_manifest(&mut self, result: Result<GameStore, ManifestError>) {
        if self.load_status != LoadStatus::Loading {
            debug!("Manifest already applied, ignoring");
            return;
        }

        match result {
            Ok(store) => {
                info!(count = store.len(), "Game store ready");
                self.store = store;
                self.load_status = LoadStatus::Loaded;
                self.refresh_view();
            }
            Err(e) => {
                warn!(error = %e, attempted = %e.attempted(), "Manifest load failed");
                self.load_status = LoadStatus::Failed(e.panel());
                self.cards.clear();
            }
        }
        // Nothing more will arrive
        self.load_rx = None;
    }

    // ===== View =====

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn cards(&self) -> &[GameCard] {
        &self.cards
    }

    pub fn selected_card(&self) -> Option<&GameCard> {
        self.cards.get(self.selection)
    }

    /// Re-run filter and sort over the whole store.
    fn refresh_view(&mut self) {
        self.cards = build_view(&self.store, &self.view);
        self.selection = 0;
        self.scroll_row = 0;
    }

    pub fn push_query_char(&mut self, c: char) {
        if self.view.query.chars().count() >= MAX_QUERY_LENGTH || c.is_control() {
            return;
        }
        self.view.query.push(c);
        self.refresh_view();
    }

    pub fn pop_query_char(&mut self) {
        if self.view.query.pop().is_some() {
            self.refresh_view();
        }
    }

    pub fn clear_query(&mut self) {
        if !self.view.query.is_empty() {
            self.view.query.clear();
            self.refresh_view();
        }
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        if self.view.sort != sort {
            self.view.sort = sort;
            self.refresh_view();
        }
    }

    pub fn cycle_sort(&mut self) {
        self.set_sort(self.view.sort.next());
    }

    pub fn cycle_sort_back(&mut self) {
        self.set_sort(self.view.sort.prev());
    }

    // ===== Selection =====

    fn grid_columns(&self) -> usize {
        layout::columns_for(layout::screen(self.viewport).grid.width)
    }

    fn grid_rows(&self) -> usize {
        layout::visible_rows(layout::screen(self.viewport).grid.height)
    }

    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.keep_selection_visible();
    }

    /// Move by whole cards horizontally or whole rows vertically, clamped to
    /// the grid.
    pub fn move_selection(&mut self, dx: isize, dy: isize) {
        if self.cards.is_empty() {
            return;
        }
        let columns = self.grid_columns() as isize;
        let last = self.cards.len() as isize - 1;
        let target = self.selection as isize + dx + dy * columns;
        self.selection = target.clamp(0, last) as usize;
        self.keep_selection_visible();
    }

    pub fn page(&mut self, pages: isize) {
        let rows = self.grid_rows() as isize;
        self.move_selection(0, rows * pages);
    }

    pub fn select_first(&mut self) {
        self.selection = 0;
        self.keep_selection_visible();
    }

    pub fn select_last(&mut self) {
        self.selection = self.cards.len().saturating_sub(1);
        self.keep_selection_visible();
    }

    pub fn select(&mut self, position: usize) {
        if position < self.cards.len() {
            self.selection = position;
            self.keep_selection_visible();
        }
    }

    fn keep_selection_visible(&mut self) {
        let columns = self.grid_columns();
        let rows = self.grid_rows();
        let row = self.selection / columns;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + rows {
            self.scroll_row = row + 1 - rows;
        }
    }

    // ===== Detail overlay =====

    /// Show details for the card at `position`, replacing any open overlay.
    pub fn open_details(&mut self, position: usize) {
        let Some(card) = self.cards.get(position) else {
            return;
        };
        let Some(game) = self.store.get(card.index) else {
            return;
        };
        self.detail = Some(DetailOverlay::from_game(card.index, game));
        self.state = AppState::ShowingDetails;
    }

    pub fn open_selected_details(&mut self) {
        self.open_details(self.selection);
    }

    pub fn close_details(&mut self) {
        self.detail = None;
        if self.state == AppState::ShowingDetails {
            self.state = AppState::Normal;
        }
    }

    // ===== Play =====

    /// Where the selected card's Play action leads.
    pub fn selected_target(&self) -> Result<(String, Url)> {
        let card = self
            .selected_card()
            .ok_or_else(|| anyhow::anyhow!("No game selected"))?;
        let target = launch::resolve_target(&self.settings.base, &card.play_path)?;
        Ok((card.title.clone(), target))
    }

    /// Where the overlay's "Play now" leads.
    pub fn detail_target(&self) -> Result<(String, Url)> {
        let detail = self
            .detail
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No game open"))?;
        let target = launch::resolve_target(&self.settings.base, &detail.play_path)?;
        Ok((detail.title.clone(), target))
    }

    pub fn play_selected(&mut self) {
        let target = self.selected_target();
        self.launch(target);
    }

    pub fn play_details(&mut self) {
        let target = self.detail_target();
        self.launch(target);
    }

    fn launch(&mut self, target: Result<(String, Url)>) {
        let result = target.and_then(|(title, url)| {
            launch::open_target(&url)?;
            Ok(title)
        });
        self.status_message = Some(match result {
            Ok(title) => format!("Launched {}", title),
            Err(e) => {
                warn!(error = %e, "Launch failed");
                format!("Can't launch: {:#}", e)
            }
        });
    }
}

/// Open the named store and bring the offline cache up, installing the core
/// assets unless an earlier install can be resumed.
pub async fn open_asset_cache(
    http: HttpTransport,
    settings: &LaunchSettings,
) -> Result<AssetCache<HttpTransport>, AssetCacheError> {
    let store = AssetStore::open(&settings.cache_root, &settings.cache_name).await?;
    AssetCache::start(http, settings.base.clone(), store, &settings.core_assets).await
}

/// One-line summary for the status bar.
pub async fn cache_summary<T: Transport>(cache: &AssetCache<T>) -> String {
    match cache.store().stats().await {
        Ok(stats) => match stats.installed {
            Some(installed) => format!(
                "Offline: {} assets, installed {}",
                stats.entries, installed
            ),
            None => format!("Offline: {} assets", stats.entries),
        },
        Err(e) => {
            warn!(error = %e, "Could not read cache stats");
            format!("Offline: {}", cache.state())
        }
    }
}
