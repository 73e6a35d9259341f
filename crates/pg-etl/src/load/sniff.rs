//! First-record header inference for files imported without a declared table.

use csv::{ByteRecord, ReaderBuilder};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::options::ImportOptions;
use crate::error::{EtlError, Result, StreamOrigin};

/// Read size while looking for the end of the first record.
const SNIFF_CHUNK_SIZE: usize = 8 * 1024;

/// Upper bound on the bytes a header record may span.
pub const MAX_HEADER_BYTES: usize = 1024 * 1024;

/// Read the first CSV record of `stream` and return its fields.
///
/// Reads only as far as needed to see the end of that record. Returns
/// `Ok(None)` for an empty stream. Fields that are not valid UTF-8 are
/// decoded lossily.
///
/// `table` is used for error context only.
pub async fn sniff_header<R>(
    stream: &mut R,
    options: &ImportOptions,
    table: &str,
) -> Result<Option<Vec<String>>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    options.validate()?;

    let mut buf = Vec::with_capacity(SNIFF_CHUNK_SIZE);
    let mut chunk = vec![0u8; SNIFF_CHUNK_SIZE];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| EtlError::stream(table, StreamOrigin::Source, e))?;
        let at_eof = n == 0;
        buf.extend_from_slice(&chunk[..n]);

        if let Some(fields) = first_record(&buf, options, at_eof)? {
            debug!("Inferred {} columns for {}", fields.len(), table);
            return Ok(Some(fields));
        }
        if at_eof {
            return Ok(None);
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(EtlError::stream(
                table,
                StreamOrigin::Source,
                format!("no complete header record within {} bytes", MAX_HEADER_BYTES),
            ));
        }
    }
}

/// Parse the first record of `buf` if it is known to be complete.
///
/// A record is complete when input continues past its terminator, or when
/// the stream has ended.
fn first_record(buf: &[u8], options: &ImportOptions, at_eof: bool) -> Result<Option<Vec<String>>> {
    let escape = options.escape_byte();
    let quote = options.quote_byte();

    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter_byte())
        .quote(quote);
    if escape == quote {
        builder.double_quote(true).escape(None);
    } else {
        builder.double_quote(false).escape(Some(escape));
    }

    let mut reader = builder.from_reader(buf);
    let mut record = ByteRecord::new();
    if !reader.read_byte_record(&mut record)? {
        return Ok(None);
    }

    let end = reader.position().byte() as usize;
    if end < buf.len() || at_eof {
        Ok(Some(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        ))
    } else {
        Ok(None)
    }
}
