use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Headline of the panel that replaces the grid when loading fails.
const PANEL_HEADLINE: &str = "No games found";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Inline manifest is invalid JSON.")]
    InvalidInline(#[source] serde_json::Error),

    #[error("HTTP {status}")]
    Http { path: String, status: u16 },

    #[error("Manifest is not an array")]
    NotAnArray { path: String },

    #[error("{source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source}")]
    Network {
        path: String,
        #[source]
        source: TransportError,
    },

    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Static diagnostic shown in place of the game grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub headline: String,
    pub message: String,
    pub hints: Vec<String>,
}

impl ManifestError {
    /// The source that was being loaded when the error happened.
    pub fn attempted(&self) -> String {
        match self {
            ManifestError::InvalidInline(_) => super::loader::INLINE_SOURCE.to_string(),
            ManifestError::Http { path, .. }
            | ManifestError::NotAnArray { path }
            | ManifestError::Parse { path, .. }
            | ManifestError::Network { path, .. } => path.clone(),
            ManifestError::Io { path, .. } => path.display().to_string(),
        }
    }

    pub fn panel(&self) -> ErrorPanel {
        let message = match self {
            ManifestError::InvalidInline(_) => self.to_string(),
            _ => format!("Couldn't load {}: {}", self.attempted(), self),
        };

        ErrorPanel {
            headline: PANEL_HEADLINE.to_string(),
            message,
            hints: vec![
                "Add/validate the inline manifest (recommended for local sites), or".to_string(),
                format!(
                    "Host the site so the fetch of {} works.",
                    super::loader::MANIFEST_PATH
                ),
            ],
        }
    }
}
