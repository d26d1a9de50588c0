use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::StoreError;

/// Identifies a stored blob. The unique name becomes the file name under the
/// storage root, so two distinct keys must never produce the same name.
pub trait ContentKey: Eq + Send + Sync {
    fn unique_name(&self) -> Cow<'_, str>;
}

impl ContentKey for u64 {
    fn unique_name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// A key made from a client supplied file name. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::InvalidKey("file name must not be empty".to_string()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContentKey for FileName {
    fn unique_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.0)
    }
}

impl Display for FileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileName::new(s)
    }
}

impl TryFrom<String> for FileName {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FileName::new(value)
    }
}
