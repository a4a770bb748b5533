//! Content-addressed image storage
//!
//! Uploaded bytes are written to `<sha256-hex>.jpg` under a fixed directory,
//! so identical content always lands on the same file and re-uploads are
//! idempotent. Retrieval falls back to `default.jpg` when a well-formed name
//! is not present on disk.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fallback asset served when a requested image is missing
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// Filesystem store for item images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the given directory (not created yet)
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory this store writes into
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the images directory if it does not exist
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Save raw bytes under their content digest and return the filename.
    ///
    /// The filename is `<sha256-hex>.jpg` regardless of the true encoding of
    /// the bytes; no image decoding is attempted. Saving identical bytes
    /// twice overwrites the same file in place.
    pub fn save(&self, bytes: &[u8]) -> Result<String> {
        let digest = Sha256::digest(bytes);
        let file_name = format!("{}.jpg", hex::encode(digest));
        std::fs::write(self.root.join(&file_name), bytes)?;
        Ok(file_name)
    }

    /// Resolve a requested filename to the path to serve.
    ///
    /// The name must end with the literal suffix `.jpg` and must not contain
    /// path separators; anything else is rejected. A well-formed name whose
    /// file is missing resolves to the default image instead of failing.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;

        let path = self.root.join(name);
        if path.exists() {
            Ok(path)
        } else {
            tracing::debug!("Image not found, serving fallback: {}", name);
            Ok(self.root.join(DEFAULT_IMAGE))
        }
    }
}

/// Allow-list check for requested image names: `<stem>.jpg`, no separators
fn validate_name(name: &str) -> Result<()> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(Error::InvalidImageName(name.to_string()));
    }
    match name.strip_suffix(".jpg") {
        Some(stem) if !stem.is_empty() => Ok(()),
        _ => Err(Error::InvalidImageName(name.to_string())),
    }
}
