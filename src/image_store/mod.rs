//! ImageStore - local persistence of downloaded images
//!
//! ## Responsibilities
//!
//! - Write captured / downloaded JPEGs under an output directory
//! - Numbered file names for live view frame dumps

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// ImageStore instance
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create new ImageStore, creating `dir` if it does not exist
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `data` as `filename`, replacing an existing file
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let name = sanitize(filename)?;
        let path = self.dir.join(name);

        fs::write(&path, data).await?;

        tracing::debug!(
            path = %path.display(),
            size = data.len(),
            "Image saved"
        );

        Ok(path)
    }

    /// Save a live view frame as `img_<index>.jpg`
    pub async fn save_frame(&self, index: u64, data: &[u8]) -> Result<PathBuf> {
        self.save(&format!("img_{}.jpg", index), data).await
    }
}

/// Keep only the final path component of camera-side names
fn sanitize(filename: &str) -> Result<&str> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::Validation(format!("invalid image file name: {:?}", filename)));
    }
    Ok(name)
}
