//! Manifest loading.
//!
//! The game list comes from exactly one of two places, tried in order:
//!
//! 1. An inline manifest embedded in the hosting page (or given as a file).
//!    When present it is authoritative, even if it fails to parse.
//! 2. `games/games.json` fetched relative to the base, bypassing caches.
//!
//! Every failure is terminal and is shown to the user as an `ErrorPanel`.

pub mod error;
pub mod inline;
pub mod loader;

pub use error::{ErrorPanel, ManifestError};
pub use inline::{extract_inline_manifest, INLINE_MANIFEST_ID};
pub use loader::{ManifestLoader, ManifestSource, MANIFEST_PATH};
