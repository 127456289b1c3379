use std::path::PathBuf;

use thiserror::Error;

use super::CacheLifecycle;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum AssetCacheError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Core asset {url} returned HTTP {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} has no origin to cache for; serve the site over http(s)")]
    NoOrigin { url: String },

    #[error("Cannot {action} while {state}")]
    Lifecycle {
        action: &'static str,
        state: CacheLifecycle,
    },
}
