//! Bridge from a byte stream into a bulk-load channel.
//!
//! A reader task drains the source into a bounded queue of chunks; the
//! calling task drains the queue into the [`CopyChannel`]. The queue bound is
//! the backpressure: the source is read no faster than the channel accepts.
//! The load resolves only after the channel confirms completion, and the
//! first error from either side ends it.

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::options::{build_copy_command, ImportOptions};
use crate::core::traits::{ByteStream, Connection};
use crate::error::{EtlError, Result, StreamOrigin};

/// Size of each chunk read from the source.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader task and the channel.
const QUEUE_DEPTH: usize = 8;

/// Outcome of a completed bulk load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    /// Table loaded.
    pub table: String,
    /// Rows the server reported as copied.
    pub rows: u64,
    /// Bytes sent from the source.
    pub bytes: u64,
}

/// Stream `input` into `table` with `COPY ... FROM STDIN`.
///
/// Fails with [`EtlError::Dml`] if the connection refuses to start the load
/// and with [`EtlError::Stream`] if the source or the channel fails during
/// it. After a failure the channel is dropped unfinished, which aborts the
/// load on the server.
pub async fn import_table_from_stream(
    conn: &dyn Connection,
    input: ByteStream,
    table: &str,
    options: &ImportOptions,
) -> Result<LoadResult> {
    let command = build_copy_command(table, options)?;
    let mut channel = conn
        .copy_in(&command)
        .await
        .map_err(|e| EtlError::dml(table, e))?;

    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    let reader = tokio::spawn(async move {
        let mut chunks = ReaderStream::with_capacity(input, CHUNK_SIZE);
        while let Some(chunk) = chunks.next().await {
            let failed = chunk.is_err();
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    });

    let outcome = async {
        let mut bytes = 0u64;
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.map_err(|e| EtlError::stream(table, StreamOrigin::Source, e))?;
            bytes += chunk.len() as u64;
            channel
                .send(chunk)
                .await
                .map_err(|e| EtlError::stream(table, StreamOrigin::Channel, e))?;
        }
        debug!("Source for {} exhausted after {} bytes", table, bytes);
        Ok::<_, EtlError>(bytes)
    }
    .await;

    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(e) => {
            reader.abort();
            return Err(e);
        }
    };

    // The queue also closes if the reader panicked; that is not a clean end.
    reader
        .await
        .map_err(|e| EtlError::stream(table, StreamOrigin::Source, e))?;

    let rows = channel
        .finish()
        .await
        .map_err(|e| EtlError::stream(table, StreamOrigin::Channel, e))?;

    info!("Loaded {} rows ({} bytes) into {}", rows, bytes, table);
    Ok(LoadResult {
        table: table.to_string(),
        rows,
        bytes,
    })
}
