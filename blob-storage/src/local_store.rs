use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use md5::{Digest, Md5};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{StoreError, StoreResult};
use crate::store::BlobStore;
use crate::stream_info::StreamInfo;

const HASH_BUFFER_SIZE: usize = 8 * 1024;

/// Stores every blob as one file directly under `base_path`, named after the key.
#[derive(Clone, Debug)]
pub struct LocalFileBlobStore {
    base_path: PathBuf,
}

impl LocalFileBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    /// Like [`LocalFileBlobStore::new`], but creates the root directory first.
    pub async fn open(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| StoreError::io(&base_path.display().to_string(), e))?;
        tracing::info!(path = %base_path.display(), "Opened local blob store");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Joins the root with `name`. Only plain path components are accepted so
    /// the result can never point outside the root.
    fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        if name.is_empty() {
            return Err(StoreError::InvalidKey("key resolves to an empty name".to_string()));
        }
        let relative = Path::new(name);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StoreError::OutsideRoot(name.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalFileBlobStore {
    async fn create(&self, name: &str, content: StreamInfo) -> StoreResult<()> {
        let file_path = self.resolve(name)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(file_path)
            .await
            .map_err(|e| StoreError::io(name, e))?;
        let declared = content.length();
        let mut reader = content.into_reader();
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StoreError::io(name, e))?;
        file.flush().await.map_err(|e| StoreError::io(name, e))?;
        if declared != 0 && declared != written {
            tracing::debug!(key = name, declared, written, "Declared length differs from copied bytes");
        }
        Ok(())
    }

    async fn exists(&self, name: &str) -> StoreResult<bool> {
        let file_path = self.resolve(name)?;
        match fs::metadata(file_path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(name, e)),
        }
    }

    async fn open_read(&self, name: &str) -> StoreResult<StreamInfo> {
        let file_path = self.resolve(name)?;
        let file = File::open(file_path).await.map_err(|e| StoreError::io(name, e))?;
        let length = file.metadata().await.map_err(|e| StoreError::io(name, e))?.len();
        Ok(StreamInfo::new(file, length))
    }

    async fn read_all_bytes(&self, name: &str) -> StoreResult<Vec<u8>> {
        let file_path = self.resolve(name)?;
        fs::read(file_path).await.map_err(|e| StoreError::io(name, e))
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let file_path = self.resolve(name)?;
        fs::remove_file(file_path).await.map_err(|e| StoreError::io(name, e))
    }

    async fn get_hash(&self, name: &str) -> StoreResult<String> {
        let file_path = self.resolve(name)?;
        let mut file = File::open(file_path).await.map_err(|e| StoreError::io(name, e))?;
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; HASH_BUFFER_SIZE];
        loop {
            let read = file.read(&mut buf).await.map_err(|e| StoreError::io(name, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}
