use std::fmt::{self, Debug, Formatter};
use std::io::Cursor;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Readable content plus its declared length. Owns the reader; dropping the
/// `StreamInfo` releases whatever handle backs it.
pub struct StreamInfo {
    length: u64,
    reader: BoxedReader,
}

impl StreamInfo {
    pub fn new<R>(reader: R, length: u64) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self { length, reader: Box::new(reader) }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let length = data.len() as u64;
        Self::new(Cursor::new(data), length)
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn reader_mut(&mut self) -> &mut BoxedReader {
        &mut self.reader
    }

    pub fn into_reader(self) -> BoxedReader {
        self.reader
    }

    /// Drains the reader into memory.
    pub async fn read_to_end(mut self) -> std::io::Result<Vec<u8>> {
        // the declared length is a hint only
        let mut data = Vec::with_capacity(self.length.min(1 << 20) as usize);
        self.reader.read_to_end(&mut data).await?;
        Ok(data)
    }
}

impl Debug for StreamInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamInfo").field("length", &self.length).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_bytes_sets_length() {
        let info = StreamInfo::from_bytes(&b"hello"[..]);
        assert_eq!(info.length(), 5);
        assert_eq!(info.read_to_end().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_declared_length_is_not_enforced_on_read() {
        let info = StreamInfo::new(Cursor::new(b"abc".to_vec()), 0);
        assert_eq!(info.length(), 0);
        assert_eq!(info.read_to_end().await.unwrap(), b"abc");
    }
}
