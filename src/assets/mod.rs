//! Deployment asset packager
//!
//! Synthesized deployment output contains `asset.<hash>` folders and
//! prebuilt `asset.<hash>.zip` archives. The packager zips each folder into
//! `<asset_dir>/<hash>.zip` and moves the `asset.` archives to an output
//! directory, stripping the first `asset.` from each name.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AssetError;

/// Marker identifying asset entries
pub const ASSET_MARKER: &str = "asset.";

/// Remove the first `asset.` occurrence from a file name
pub fn strip_asset_prefix(name: &str) -> String {
    name.replacen(ASSET_MARKER, "", 1)
}

/// Zips and relocates deployment assets
#[derive(Debug, Clone)]
pub struct AssetPackager {
    asset_dir: PathBuf,
}

impl AssetPackager {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Entries of the asset directory whose name contains `asset.`
    ///
    /// Matching is case-sensitive. A directory that cannot be read yields an
    /// empty list.
    pub async fn asset_paths(&self) -> Vec<PathBuf> {
        match self.entry_names().await {
            Ok(names) => names
                .into_iter()
                .filter(|name| name.contains(ASSET_MARKER))
                .map(|name| self.asset_dir.join(name))
                .collect(),
            Err(e) => {
                error!(directory = %self.asset_dir.display(), error = %e, "Unable to read asset directory");
                Vec::new()
            }
        }
    }

    /// Zip an asset folder into the asset directory
    ///
    /// Returns the archive path, or `None` when `folder` is not a directory.
    pub async fn create_asset_zip(&self, folder: &Path) -> Result<Option<PathBuf>, AssetError> {
        let metadata = tokio::fs::symlink_metadata(folder).await?;
        if !metadata.is_dir() {
            debug!(path = %folder.display(), "Skipping non-directory asset");
            return Ok(None);
        }

        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(AssetError::UndefinedPath)?;
        let target = self
            .asset_dir
            .join(format!("{}.zip", strip_asset_prefix(&name)));

        let source = folder.to_path_buf();
        let archive = target.clone();
        tokio::task::spawn_blocking(move || zip_directory(&source, &archive))
            .await
            .map_err(|e| AssetError::Zip(format!("Zip task failed: {}", e)))??;

        info!(source = %folder.display(), archive = %target.display(), "Created asset zip");
        Ok(Some(target))
    }

    /// Move asset archives to `output_dir` with the first `asset.` removed
    pub async fn move_zips(&self, output_dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let mut moved = Vec::new();
        for name in self.entry_names().await? {
            if !name.contains(ASSET_MARKER) || !name.ends_with(".zip") {
                continue;
            }

            let from = self.asset_dir.join(&name);
            let to = output_dir.join(strip_asset_prefix(&name));
            tokio::fs::rename(&from, &to).await?;
            debug!(from = %from.display(), to = %to.display(), "Moved asset zip");
            moved.push(to);
        }

        Ok(moved)
    }

    /// Zip every asset folder under `input` and move the archives to `output`
    pub async fn package(input: &Path, output: &Path) -> Result<Vec<PathBuf>, AssetError> {
        if input.as_os_str().is_empty() || output.as_os_str().is_empty() {
            return Err(AssetError::UndefinedPath);
        }

        let packager = Self::new(input);
        for path in packager.asset_paths().await {
            packager.create_asset_zip(&path).await?;
        }
        packager.move_zips(output).await
    }

    async fn entry_names(&self) -> Result<Vec<String>, AssetError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.asset_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

fn zip_directory(source: &Path, target: &Path) -> Result<(), AssetError> {
    let file = File::create(target)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    add_entries(&mut zip, source, source, options)?;
    zip.finish()?;
    Ok(())
}

fn add_entries<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    root: &Path,
    dir: &Path,
    options: FileOptions,
) -> Result<(), AssetError> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map_err(|e| AssetError::Zip(e.to_string()))?;
        // Archive names always use forward slashes
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type()?.is_dir() {
            zip.add_directory(name, options)?;
            add_entries(zip, root, &path, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut file = File::open(&path)?;
            std::io::copy(&mut file, zip)?;
        }
    }

    Ok(())
}
