//! Asset keys and image metadata lookups.
//!
//! An asset key is a `/`-separated path relative to the assets directory,
//! including its extension (`images/sprites/overworld/lenard/id_down.png`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

pub fn resolve_asset_path(assets_dir: &Path, key: &str) -> Result<PathBuf, AssetKeyError> {
    validate_asset_key(key)?;
    Ok(key
        .split('/')
        .fold(assets_dir.to_path_buf(), |path, segment| path.join(segment)))
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("asset not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Reads image headers under the assets directory and remembers their sizes.
#[derive(Debug)]
pub struct ImageCatalog {
    assets_dir: PathBuf,
    sizes: HashMap<String, (u32, u32)>,
}

impl ImageCatalog {
    pub fn new(assets_dir: PathBuf) -> Self {
        Self {
            assets_dir,
            sizes: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn exists(&self, key: &str) -> bool {
        resolve_asset_path(&self.assets_dir, key)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    pub fn dimensions(&mut self, key: &str) -> Result<(u32, u32), AssetError> {
        if let Some(size) = self.sizes.get(key) {
            return Ok(*size);
        }
        let path =
            resolve_asset_path(&self.assets_dir, key).map_err(|source| AssetError::InvalidKey {
                key: key.to_string(),
                source,
            })?;
        if !path.is_file() {
            return Err(AssetError::NotFound { path });
        }
        let size = image::image_dimensions(&path).map_err(|error| AssetError::Decode {
            path: path.clone(),
            message: error.to_string(),
        })?;
        debug!(asset = key, width = size.0, height = size.1, "image_probed");
        self.sizes.insert(key.to_string(), size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_keys() {
        for key in [
            "images/Elfinal.png",
            "ui_assets/textboxnpc.png",
            "fonts/DTM-Sans.otf",
        ] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a.png", "..", "a/../b.png", r"a\b.png", "a b.png", "ñ.png"] {
            assert!(validate_asset_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn dimensions_reads_png_header_and_caches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).expect("images dir");
        image::RgbaImage::new(12, 7)
            .save(images.join("box.png"))
            .expect("write png");

        let mut catalog = ImageCatalog::new(dir.path().to_path_buf());
        assert!(catalog.exists("images/box.png"));
        assert_eq!(catalog.dimensions("images/box.png").expect("size"), (12, 7));

        std::fs::remove_file(images.join("box.png")).expect("remove");
        assert_eq!(
            catalog.dimensions("images/box.png").expect("cached size"),
            (12, 7)
        );
    }

    #[test]
    fn missing_image_reports_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = ImageCatalog::new(dir.path().to_path_buf());

        let error = catalog.dimensions("images/nope.png").expect_err("missing");
        assert!(matches!(error, AssetError::NotFound { .. }));
        assert!(!catalog.exists("images/nope.png"));
    }

    #[test]
    fn traversal_key_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = ImageCatalog::new(dir.path().to_path_buf());

        let error = catalog.dimensions("../secret.png").expect_err("invalid");
        assert!(matches!(
            error,
            AssetError::InvalidKey {
                source: AssetKeyError::ParentTraversal,
                ..
            }
        ));
    }
}
