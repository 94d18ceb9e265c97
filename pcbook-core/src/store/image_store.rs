use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::StoreResult;

/// Where an uploaded image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub laptop_id: String,
    pub image_type: String,
    pub path: PathBuf,
}

/// Persistence for uploaded laptop images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `data` and return the generated image id.
    async fn save(&self, laptop_id: &str, image_type: &str, data: Vec<u8>) -> StoreResult<String>;
}

/// Writes each image to `<folder>/<id><image_type>`
pub struct DiskImageStore {
    folder: PathBuf,
    images: RwLock<HashMap<String, ImageInfo>>,
}

impl DiskImageStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            images: RwLock::new(HashMap::new()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub async fn info(&self, image_id: &str) -> Option<ImageInfo> {
        self.images.read().await.get(image_id).cloned()
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, laptop_id: &str, image_type: &str, data: Vec<u8>) -> StoreResult<String> {
        let image_id = Uuid::new_v4().to_string();
        let path = self.folder.join(format!("{image_id}{image_type}"));

        tokio::fs::create_dir_all(&self.folder).await?;
        tokio::fs::write(&path, &data).await?;

        self.images.write().await.insert(
            image_id.clone(),
            ImageInfo {
                laptop_id: laptop_id.to_string(),
                image_type: image_type.to_string(),
                path,
            },
        );
        Ok(image_id)
    }
}
