use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};
use crate::key::ContentKey;
use crate::key_lock::KeyLocks;
use crate::result::OperationResult;
use crate::store::BlobStore;
use crate::stream_info::StreamInfo;

/// File content management keyed by `K`. Every call reports its outcome as an
/// [`OperationResult`]; errors never escape as `Err` or panics.
#[async_trait]
pub trait ContentProvider<K: ContentKey>: Send + Sync {
    /// Persists `content` under `key`, replacing anything already there.
    async fn store(&self, key: &K, content: StreamInfo, cancel: &CancellationToken) -> OperationResult<bool>;

    async fn exists(&self, key: &K, cancel: &CancellationToken) -> OperationResult<bool>;

    /// Opens the content for streaming. The returned handle is the caller's to drop.
    async fn get(&self, key: &K, cancel: &CancellationToken) -> OperationResult<StreamInfo>;

    async fn get_bytes(&self, key: &K, cancel: &CancellationToken) -> OperationResult<Vec<u8>>;

    /// Overwrites the content under `key`. There is no partial update.
    async fn update(&self, key: &K, content: StreamInfo, cancel: &CancellationToken) -> OperationResult<bool>;

    /// Fails with [`StoreError::NotFound`] when nothing is stored under `key`.
    async fn delete(&self, key: &K, cancel: &CancellationToken) -> OperationResult<bool>;

    /// Lowercase hex MD5 of the content.
    async fn get_hash(&self, key: &K, cancel: &CancellationToken) -> OperationResult<String>;
}

/// [`ContentProvider`] over any [`BlobStore`]. Calls on the same key are
/// serialized within this provider.
pub struct FileContentProvider<S> {
    store: S,
    locks: KeyLocks,
}

impl<S: BlobStore> FileContentProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store, locks: KeyLocks::new() }
    }

    pub fn blob_store(&self) -> &S {
        &self.store
    }

    async fn write(&self, op: &'static str, name: &str, content: StreamInfo, cancel: &CancellationToken) -> OperationResult<bool> {
        let (store, locks) = (&self.store, &self.locks);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            store.create(name, content).await
        })
        .await;
        finish(op, name, result.map(|()| true))
    }
}

/// Runs `op` unless `cancel` fires first. A token that is already cancelled
/// short-circuits without polling `op` at all.
async fn cancellable<T, F>(cancel: &CancellationToken, op: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = op => result,
    }
}

fn finish<T>(op: &'static str, name: &str, result: StoreResult<T>) -> OperationResult<T> {
    match &result {
        Ok(_) => tracing::debug!(op, key = name, "Content operation succeeded"),
        Err(e) => tracing::warn!(op, key = name, error = %e, "Content operation failed"),
    }
    OperationResult::from(result)
}

#[async_trait]
impl<K, S> ContentProvider<K> for FileContentProvider<S>
where
    K: ContentKey,
    S: BlobStore,
{
    async fn store(&self, key: &K, content: StreamInfo, cancel: &CancellationToken) -> OperationResult<bool> {
        let name = key.unique_name();
        self.write("store", &name, content, cancel).await
    }

    async fn exists(&self, key: &K, cancel: &CancellationToken) -> OperationResult<bool> {
        let name = key.unique_name();
        let (store, locks, name) = (&self.store, &self.locks, &*name);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            store.exists(name).await
        })
        .await;
        finish("exists", name, result)
    }

    async fn get(&self, key: &K, cancel: &CancellationToken) -> OperationResult<StreamInfo> {
        let name = key.unique_name();
        let (store, locks, name) = (&self.store, &self.locks, &*name);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            let opened = store.open_read(name).await?;
            let length = opened.length();
            Ok::<_, StoreError>(StreamInfo::new(opened.into_reader(), length))
        })
        .await;
        finish("get", name, result)
    }

    async fn get_bytes(&self, key: &K, cancel: &CancellationToken) -> OperationResult<Vec<u8>> {
        let name = key.unique_name();
        let (store, locks, name) = (&self.store, &self.locks, &*name);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            store.read_all_bytes(name).await
        })
        .await;
        finish("get_bytes", name, result)
    }

    async fn update(&self, key: &K, content: StreamInfo, cancel: &CancellationToken) -> OperationResult<bool> {
        let name = key.unique_name();
        self.write("update", &name, content, cancel).await
    }

    async fn delete(&self, key: &K, cancel: &CancellationToken) -> OperationResult<bool> {
        let name = key.unique_name();
        let (store, locks, name) = (&self.store, &self.locks, &*name);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            if !store.exists(name).await? {
                return Err(StoreError::NotFound(name.to_string()));
            }
            store.delete(name).await
        })
        .await;
        finish("delete", name, result.map(|()| true))
    }

    async fn get_hash(&self, key: &K, cancel: &CancellationToken) -> OperationResult<String> {
        let name = key.unique_name();
        let (store, locks, name) = (&self.store, &self.locks, &*name);
        let result = cancellable(cancel, async move {
            let _guard = locks.lock(name).await;
            store.get_hash(name).await
        })
        .await;
        finish("get_hash", name, result)
    }
}
