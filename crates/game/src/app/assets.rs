use std::fs;
use std::io;
use std::path::PathBuf;

use engine::{AppPaths, AssetError, ImageCatalog};

use super::world::WorldError;

/// Where scenes get map text and image sizes from.
pub(crate) trait AssetSource {
    fn image_size(&mut self, key: &str) -> Result<(u32, u32), WorldError>;
    fn read_map(&self, map_id: &str) -> Result<String, WorldError>;
}

pub(crate) struct DiskAssets {
    images: ImageCatalog,
    maps_dir: PathBuf,
}

impl DiskAssets {
    pub(crate) fn new(paths: &AppPaths) -> Self {
        Self {
            images: ImageCatalog::new(paths.assets_dir.clone()),
            maps_dir: paths.maps_dir.clone(),
        }
    }

    fn map_path(&self, map_id: &str) -> PathBuf {
        self.maps_dir.join(format!("{map_id}.json"))
    }
}

impl AssetSource for DiskAssets {
    fn image_size(&mut self, key: &str) -> Result<(u32, u32), WorldError> {
        self.images.dimensions(key).map_err(|error| match error {
            AssetError::NotFound { path } => WorldError::ResourceNotFound {
                kind: "image",
                name: path.display().to_string(),
            },
            AssetError::InvalidKey { key, source } => WorldError::MalformedDefinition {
                origin: key,
                message: source.to_string(),
            },
            AssetError::Decode { path, message } => WorldError::MalformedDefinition {
                origin: path.display().to_string(),
                message,
            },
        })
    }

    fn read_map(&self, map_id: &str) -> Result<String, WorldError> {
        if map_id.is_empty() || map_id.contains(['/', '\\', '.']) {
            return Err(WorldError::ResourceNotFound {
                kind: "map",
                name: map_id.to_string(),
            });
        }
        let path = self.map_path(map_id);
        fs::read_to_string(&path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => WorldError::ResourceNotFound {
                kind: "map",
                name: path.display().to_string(),
            },
            _ => WorldError::MalformedDefinition {
                origin: path.display().to_string(),
                message: error.to_string(),
            },
        })
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryAssets;
