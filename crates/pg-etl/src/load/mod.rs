//! Bulk loading of CSV sources into tables.
//!
//! [`import_table`] materializes the destination and then streams the source
//! into it with [`import_table_from_stream`]. A destination declared in the
//! schema is dropped and recreated with its declared columns. An undeclared
//! one becomes a temporary all-text table named after the source's first
//! record, which is why the source must be re-openable.

mod options;
mod sniff;
mod stream;

pub use options::{build_copy_command, ImportOptions};
pub use sniff::{sniff_header, MAX_HEADER_BYTES};
pub use stream::{import_table_from_stream, LoadResult};

use tracing::{debug, info};

use crate::core::schema::Schema;
use crate::core::traits::{ByteSource, ByteStream, Connection};
use crate::ddl::{create_schema, create_temporary_table};
use crate::error::{EtlError, Result, StreamOrigin};

/// Create (or recreate) `target` and load `source` into it.
pub async fn import_table(
    conn: &dyn Connection,
    schema: &Schema,
    source: &dyn ByteSource,
    target: &str,
    options: &ImportOptions,
) -> Result<LoadResult> {
    options.validate()?;
    info!("Importing {} into {}", source.describe(), target);

    if schema.find(target).is_some() {
        create_schema(conn, &schema.subset(&[target])).await?;
    } else {
        let mut header_stream = open(source, target).await?;
        let header = sniff_header(&mut header_stream, options, target)
            .await?
            .unwrap_or_default();
        drop(header_stream);

        debug!("{} is not declared; inferred columns {:?}", target, header);
        let columns: Vec<Option<String>> = header.into_iter().map(Some).collect();
        create_temporary_table(conn, target, &columns).await?;
    }

    let input = open(source, target).await?;
    import_table_from_stream(conn, input, target, options).await
}

async fn open(source: &dyn ByteSource, table: &str) -> Result<ByteStream> {
    source
        .open()
        .await
        .map_err(|e| EtlError::stream(table, StreamOrigin::Source, e))
}
