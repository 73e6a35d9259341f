//! Foundational types shared by every component of the engine.
//!
//! - [`identifier`]: identifier and literal quoting
//! - [`schema`]: declarative table definitions
//! - [`traits`]: connection, bulk-load channel and byte source capabilities

pub mod identifier;
pub mod schema;
pub mod traits;

pub use identifier::{quote_identifier, quote_literal, quote_text, NULL_LITERAL};
pub use schema::{ColumnDefinition, Schema, TableDefinition};
pub use traits::{ByteSource, ByteStream, Connection, CopyChannel};
