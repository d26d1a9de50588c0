use async_trait::async_trait;

use crate::error::StoreResult;
use crate::stream_info::StreamInfo;

/// Raw byte-level operations on named blobs. Implementations report every
/// failure to the caller; nothing is swallowed at this layer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates or truncates the blob and copies `content` into it.
    async fn create(&self, name: &str, content: StreamInfo) -> StoreResult<()>;

    /// `Ok(false)` when nothing is stored under `name`.
    async fn exists(&self, name: &str) -> StoreResult<bool>;

    /// Opens the blob for reading. The caller owns the returned handle.
    async fn open_read(&self, name: &str) -> StoreResult<StreamInfo>;

    async fn read_all_bytes(&self, name: &str) -> StoreResult<Vec<u8>>;

    /// Removes the blob. Deleting something that is not there is an error.
    async fn delete(&self, name: &str) -> StoreResult<()>;

    /// Lowercase hex MD5 digest of the blob content.
    async fn get_hash(&self, name: &str) -> StoreResult<String>;
}
