//! Named blob storage: a raw [`BlobStore`] backend and the [`ContentProvider`]
//! facade that turns every backend outcome into an [`OperationResult`].

pub mod error;
pub mod key;
pub mod key_lock;
pub mod local_store;
pub mod provider;
pub mod result;
pub mod store;
pub mod stream_info;

pub use error::{ErrorKind, StoreError, StoreResult};
pub use key::{ContentKey, FileName};
pub use local_store::LocalFileBlobStore;
pub use provider::{ContentProvider, FileContentProvider};
pub use result::OperationResult;
pub use store::BlobStore;
pub use stream_info::StreamInfo;

pub use tokio_util::sync::CancellationToken;
