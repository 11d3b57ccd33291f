//! Configuration file access
//!
//! Configuration files reference each other by path. Relative paths are
//! resolved against the reader's base directory, which is normally the
//! process working directory.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ReaderError;

/// Read access to the configuration file graph
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigFileReader: Send + Sync {
    /// JSON files directly under `directory`, sorted by name
    async fn list_config_files(&self, directory: &Path) -> Result<Vec<String>, ReaderError>;

    /// Parse a JSON configuration file
    async fn parse_file(&self, path: &str) -> Result<Value, ReaderError>;

    /// Raw text of a rules file; `None` if it cannot be read
    async fn read_raw_text(&self, path: &str) -> Option<String>;
}

/// Filesystem-backed reader
#[derive(Debug, Clone)]
pub struct FsConfigReader {
    base_dir: PathBuf,
}

impl FsConfigReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Reader rooted at the current working directory
    pub fn from_current_dir() -> Result<Self, ReaderError> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[async_trait]
impl ConfigFileReader for FsConfigReader {
    async fn list_config_files(&self, directory: &Path) -> Result<Vec<String>, ReaderError> {
        let directory = if directory.is_absolute() {
            directory.to_path_buf()
        } else {
            self.base_dir.join(directory)
        };

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Symlinks to files count as files
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(path.to_string_lossy().into_owned());
            }
        }
        files.sort();

        debug!(directory = %directory.display(), count = files.len(), "Listed config files");
        Ok(files)
    }

    async fn parse_file(&self, path: &str) -> Result<Value, ReaderError> {
        let resolved = self.resolve(path);
        let content = tokio::fs::read_to_string(&resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReaderError::NotFound(path.to_string())
            } else {
                ReaderError::Io(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|e| ReaderError::Parse(format!("{}: {}", path, e)))
    }

    async fn read_raw_text(&self, path: &str) -> Option<String> {
        match tokio::fs::read_to_string(self.resolve(path)).await {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(path = path, error = %e, "Unable to read rules file");
                None
            }
        }
    }
}
