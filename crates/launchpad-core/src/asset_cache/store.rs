//! On-disk named cache store.
//!
//! One directory per cache name. Each entry is two files keyed by the
//! SHA-256 of the request URL: `<key>.body` holds the raw bytes and
//! `<key>.json` holds the response metadata wrapped in `CachedData`. The
//! metadata is written last, so an entry only exists once both are on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::AssetCacheError;
use crate::transport::AssetResponse;

/// Marker recording which core assets were installed into the store.
const INSTALL_RECORD_FILE: &str = "installed.json";

/// Distinguishes temporary files of concurrent writers to the same entry.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Response metadata stored next to the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallRecord {
    pub core_assets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub installed: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    name: String,
    dir: PathBuf,
}

impl AssetStore {
    /// Open (creating if needed) the store called `name` under `cache_root`.
    pub async fn open(cache_root: &Path, name: &str) -> Result<Self, AssetCacheError> {
        let dir = cache_root.join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AssetCacheError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for a request: the URL without its fragment, hashed.
    pub fn key(url: &Url) -> String {
        let mut request = url.clone();
        request.set_fragment(None);
        hex::encode(Sha256::digest(request.as_str().as_bytes()))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.body", key))
    }

    /// Look up a stored response.
    pub async fn match_url(&self, url: &Url) -> Result<Option<AssetResponse>, AssetCacheError> {
        let key = Self::key(url);
        let Some(meta) = self.read_json::<ResponseMeta>(&self.meta_path(&key)).await? else {
            return Ok(None);
        };

        let body_path = self.body_path(&key);
        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AssetCacheError::Io {
                    path: body_path,
                    source,
                })
            }
        };

        Ok(Some(AssetResponse {
            url: meta.data.url,
            status: meta.data.status,
            content_type: meta.data.content_type,
            body,
        }))
    }

    /// Store a response under the request URL, replacing any previous entry.
    pub async fn put(&self, url: &Url, response: &AssetResponse) -> Result<(), AssetCacheError> {
        let key = Self::key(url);
        let meta = CachedData::new(ResponseMeta {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
        });

        self.write_atomic(&self.body_path(&key), &response.body).await?;
        self.write_json(&self.meta_path(&key), &meta).await?;
        debug!(cache = %self.name, url = %url, bytes = response.body.len(), "Stored asset");
        Ok(())
    }

    /// Drop a stored response. Missing entries are not an error.
    pub async fn remove(&self, url: &Url) -> Result<(), AssetCacheError> {
        let key = Self::key(url);
        // Metadata first, so a half-removed entry is already a miss
        remove_if_present(&self.meta_path(&key)).await?;
        remove_if_present(&self.body_path(&key)).await
    }

    pub async fn install_record(&self) -> Result<Option<CachedData<InstallRecord>>, AssetCacheError> {
        self.read_json(&self.dir.join(INSTALL_RECORD_FILE)).await
    }

    pub async fn write_install_record(&self, core_assets: &[String]) -> Result<(), AssetCacheError> {
        let record = CachedData::new(InstallRecord {
            core_assets: core_assets.to_vec(),
        });
        self.write_json(&self.dir.join(INSTALL_RECORD_FILE), &record).await
    }

    pub async fn remove_install_record(&self) -> Result<(), AssetCacheError> {
        remove_if_present(&self.dir.join(INSTALL_RECORD_FILE)).await
    }

    /// Number of stored entries and when the core assets were installed.
    pub async fn stats(&self) -> Result<StoreStats, AssetCacheError> {
        let mut entries = 0;
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|source| AssetCacheError::Io {
                path: self.dir.clone(),
                source,
            })?;
        while let Ok(Some(entry)) = dir.next_entry().await {
            if entry.path().extension().is_some_and(|ext| ext == "body") {
                entries += 1;
            }
        }

        let installed = self.install_record().await?.map(|r| r.age_display());
        Ok(StoreStats { entries, installed })
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<CachedData<T>>, AssetCacheError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AssetCacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let cached = serde_json::from_str(&contents).map_err(|source| AssetCacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(cached))
    }

    async fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<(), AssetCacheError> {
        let contents = serde_json::to_vec_pretty(data).map_err(|source| AssetCacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_atomic(path, &contents).await
    }

    /// Write through a temporary file so readers never see a partial entry.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), AssetCacheError> {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("tmp-{}-{}", std::process::id(), seq));
        let io_err = |source| AssetCacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        tokio::fs::write(&tmp, contents).await.map_err(io_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        Ok(())
    }
}

async fn remove_if_present(path: &Path) -> Result<(), AssetCacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(AssetCacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
