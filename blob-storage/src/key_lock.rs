use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// One async mutex per key name, created on first use and dropped again once
/// nobody holds or waits for it.
///
/// The guard covers the operation's own future only. When a write is
/// cancelled, a blocking write already handed to the runtime's thread pool
/// can still land after the guard is released.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: LockTable,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, name: &str) -> KeyGuard {
        let mutex = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let acquire = Acquire {
            name: name.to_string(),
            locks: self.locks.clone(),
            pending: Some(Box::pin(mutex.lock_owned())),
        };
        let guard = acquire.await;
        KeyGuard {
            name: name.to_string(),
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Drops the entry for `name` when the table holds the last reference. Every
/// other reference is cloned out of the table under the shard lock, so the
/// count cannot grow while this check runs.
fn prune(locks: &LockTable, name: &str) {
    locks.remove_if(name, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// A pending acquisition. Dropping it before it completes releases its
/// reference and prunes the entry.
struct Acquire {
    name: String,
    locks: LockTable,
    pending: Option<Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>>,
}

impl Future for Acquire {
    type Output = OwnedMutexGuard<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let pending = self.pending.as_mut().expect("Acquire polled after completion");
        let guard = ready!(pending.as_mut().poll(cx));
        self.pending = None;
        Poll::Ready(guard)
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if self.pending.take().is_some() {
            prune(&self.locks, &self.name);
        }
    }
}

pub struct KeyGuard {
    name: String,
    locks: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // release first so only the table's reference can be left
        self.guard.take();
        prune(&self.locks, &self.name);
    }
}
