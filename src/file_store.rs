//! Local-directory [`ResultStore`].
//!
//! Every result is a flat file named exactly after its result ID inside a
//! single storage root (`processed_files/` by default). The root is created
//! when the store is opened and again on save if it has since vanished.
//!
//! Result IDs arrive from URLs, so only IDs that name a single plain file
//! inside the root are accepted. Anything else (path separators, `..`,
//! empty strings) is treated as absent on read and rejected on save.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use sales_summary_core::store::ResultStore;

use crate::config::Config;

/// Result store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage root: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Open the store configured under `[storage]`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.storage.root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a result ID to its file path, or `None` if the ID could escape
    /// the storage root.
    pub fn path_for(&self, id: &str) -> Option<PathBuf> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !id.contains(['/', '\\']) => {
                Some(self.root.join(name))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ResultStore for LocalFileStore {
    async fn save(&self, id: &str, content: &str) -> Result<String> {
        let Some(path) = self.path_for(id) else {
            bail!("invalid result id: {:?}", id);
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create storage root: {}", self.root.display()))?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write result file: {}", path.display()))?;

        tracing::debug!(id, path = %path.display(), bytes = content.len(), "saved result");
        Ok(path.display().to_string())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let Some(path) = self.path_for(id) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to stat result file: {}", path.display())),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<String>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read result file: {}", path.display())),
        }
    }
}
