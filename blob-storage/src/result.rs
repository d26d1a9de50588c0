use crate::error::{ErrorKind, StoreError, StoreResult};

/// Outcome of a content provider call: either a payload or the error that
/// prevented it, never both.
#[derive(Debug)]
#[must_use]
pub struct OperationResult<T> {
    inner: StoreResult<T>,
}

impl<T> OperationResult<T> {
    pub fn success(payload: T) -> Self {
        Self { inner: Ok(payload) }
    }

    pub fn failure(error: StoreError) -> Self {
        Self { inner: Err(error) }
    }

    pub fn is_success(&self) -> bool {
        self.inner.is_ok()
    }

    pub fn is_fail(&self) -> bool {
        self.inner.is_err()
    }

    pub fn result_object(&self) -> Option<&T> {
        self.inner.as_ref().ok()
    }

    pub fn into_result_object(self) -> Option<T> {
        self.inner.ok()
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.inner.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(StoreError::kind)
    }

    pub fn into_result(self) -> StoreResult<T> {
        self.inner
    }
}

impl<T: Default> OperationResult<T> {
    /// Success that carries no data of interest.
    pub fn done() -> Self {
        Self::success(T::default())
    }
}

impl<T> From<StoreResult<T>> for OperationResult<T> {
    fn from(inner: StoreResult<T>) -> Self {
        Self { inner }
    }
}
