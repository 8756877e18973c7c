//! Content-addressed cache for the python analysis layer
//!
//! Archives are keyed by a digest of the requested library list. A sidecar
//! file holds the digest of the finished archive and is written only after the
//! archive has been renamed into place, so an interrupted build never looks
//! complete.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{DeployError, Result};

/// Installs python libraries and zips them into a layer archive
#[async_trait]
pub trait LayerPackager: Send + Sync {
    /// Write a complete layer archive for `libs` to `archive`
    async fn package(&self, libs: &[String], archive: &Path) -> Result<()>;
}

/// Cache key for a library list; order of the list does not matter
pub fn cache_key(libs: &[String]) -> String {
    let mut sorted: Vec<&str> = libs.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for lib in sorted {
        hasher.update(lib.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// How [`LayerCache::ensure`] satisfied the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    /// A verified archive was already present
    Reused,
    /// The archive was (re)built
    Built,
}

pub struct LayerCache {
    cache_dir: PathBuf,
    publish_path: PathBuf,
    packager: Arc<dyn LayerPackager>,
}

impl LayerCache {
    /// `publish_path` is the stable location templates reference
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        publish_path: impl Into<PathBuf>,
        packager: Arc<dyn LayerPackager>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            publish_path: publish_path.into(),
            packager,
        }
    }

    pub fn archive_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("layer-{}.zip", key))
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("layer-{}.zip.sha256", key))
    }

    fn partial_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("layer-{}.zip.partial", key))
    }

    /// Make sure a verified archive for `libs` exists and is published
    pub async fn ensure(&self, libs: &[String]) -> Result<LayerStatus> {
        let key = cache_key(libs);
        let archive = self.archive_path(&key);

        let status = if self.verify(&key).await? {
            debug!(archive = %archive.display(), "layer archive verified, not rebuilding");
            LayerStatus::Reused
        } else {
            self.rebuild(&key, libs).await?;
            LayerStatus::Built
        };

        if let Some(parent) = self.publish_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&archive, &self.publish_path).await?;
        Ok(status)
    }

    /// True only when both files exist and the archive matches its sidecar
    async fn verify(&self, key: &str) -> Result<bool> {
        let archive = self.archive_path(key);
        let sidecar = self.sidecar_path(key);

        let (bytes, recorded) = match (fs::read(&archive).await, fs::read_to_string(&sidecar).await)
        {
            (Ok(bytes), Ok(recorded)) => (bytes, recorded),
            (Ok(_), Err(_)) => {
                warn!(archive = %archive.display(), "layer archive has no digest, rebuilding");
                return Ok(false);
            }
            _ => return Ok(false),
        };

        if digest(&bytes) == recorded.trim() {
            Ok(true)
        } else {
            warn!(archive = %archive.display(), "layer archive digest mismatch, rebuilding");
            Ok(false)
        }
    }

    async fn rebuild(&self, key: &str, libs: &[String]) -> Result<()> {
        let archive = self.archive_path(key);
        let sidecar = self.sidecar_path(key);
        let partial = self.partial_path(key);

        fs::create_dir_all(&self.cache_dir).await?;
        for stale in [&archive, &sidecar, &partial] {
            remove_if_exists(stale).await?;
        }

        info!("downloading python libraries {}", libs.join(","));
        self.packager.package(libs, &partial).await?;

        let bytes = fs::read(&partial).await.map_err(|e| {
            DeployError::Artifact(format!(
                "layer packager produced no archive at {}: {}",
                partial.display(),
                e
            ))
        })?;
        fs::rename(&partial, &archive).await?;
        fs::write(&sidecar, digest(&bytes)).await?;
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
