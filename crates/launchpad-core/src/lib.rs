//! Launchpad core library.
//!
//! Everything the launcher needs that is independent of the terminal:
//!
//! - `models`: the `Game` record as it appears in the manifest
//! - `manifest`: loading the manifest from an inline source or the network
//! - `view`: the pure filter/sort pipeline producing `GameCard`s
//! - `overlay`: the detail overlay view model
//! - `transport`: the `Transport` seam and its HTTP/file implementation
//! - `asset_cache`: the cache-first offline asset cache
//! - `utils`: small string helpers

pub mod asset_cache;
pub mod manifest;
pub mod models;
pub mod overlay;
pub mod transport;
pub mod utils;
pub mod view;

pub use asset_cache::{AssetCache, AssetCacheError, CacheLifecycle};
pub use manifest::{ErrorPanel, ManifestError, ManifestLoader, ManifestSource};
pub use models::{Game, Released};
pub use overlay::DetailOverlay;
pub use transport::{AssetResponse, CacheMode, HttpTransport, Transport, TransportError};
pub use view::{build_view, GameCard, GameStore, SortMode, ViewState};

// Base and request URLs in the public API are `reqwest` URLs.
pub use reqwest::Url;
