//! Capabilities the engine consumes from its collaborators.
//!
//! - [`Connection`]: executes SQL and opens bulk-load channels
//! - [`CopyChannel`]: the writable side of a `COPY ... FROM STDIN`
//! - [`ByteSource`]: a re-openable origin of raw bytes (a CSV file)
//!
//! The engine issues statements sequentially and never concurrently on one
//! connection. Transactions, pooling and retries belong to the caller.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::ConnectionError;

/// Boxed readable byte stream.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// A database session able to run statements and accept bulk loads.
///
/// Implementations must keep a single session: temporary tables created by
/// one call have to be visible to the next.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, ConnectionError>;

    /// Start a bulk load with the given `COPY ... FROM STDIN` command.
    async fn copy_in(&self, sql: &str) -> Result<Box<dyn CopyChannel>, ConnectionError>;
}

/// Writable side of an in-progress bulk load.
///
/// Dropping a channel without calling [`finish`](CopyChannel::finish) must
/// abort the load.
#[async_trait]
pub trait CopyChannel: Send {
    /// Send a chunk, waiting until the channel has capacity for it.
    async fn send(&mut self, chunk: Bytes) -> Result<(), ConnectionError>;

    /// Complete the load, returning the number of rows the server accepted.
    async fn finish(&mut self) -> Result<u64, ConnectionError>;
}

/// Origin of a byte stream that can be read more than once.
///
/// Importing a table without a declared schema reads the first record to
/// infer column names, then reads the whole source again for the load.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Open a fresh stream positioned at the start of the source.
    async fn open(&self) -> std::io::Result<ByteStream>;

    /// Human-readable description used in logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl ByteSource for PathBuf {
    async fn open(&self) -> std::io::Result<ByteStream> {
        let file = tokio::fs::File::open(self).await?;
        Ok(Box::new(file))
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}

#[async_trait]
impl ByteSource for Bytes {
    async fn open(&self) -> std::io::Result<ByteStream> {
        Ok(Box::new(std::io::Cursor::new(self.clone())))
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_bytes_source_reopens_from_start() {
        let source = Bytes::from_static(b"a,b\n1,2\n");
        for _ in 0..2 {
            let mut stream = source.open().await.unwrap();
            let mut out = String::new();
            stream.read_to_string(&mut out).await.unwrap();
            assert_eq!(out, "a,b\n1,2\n");
        }
    }

    #[tokio::test]
    async fn test_path_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x\n1\n").unwrap();
        let path = file.path().to_path_buf();

        let mut stream = path.open().await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"x\n1\n");
        assert_eq!(path.describe(), file.path().display().to_string());
    }

    #[tokio::test]
    async fn test_missing_path_fails_to_open() {
        let path = PathBuf::from("/definitely/not/here.csv");
        assert!(path.open().await.is_err());
    }
}
