//! Connection implementations.
//!
//! - [`postgres`]: a live PostgreSQL session
//! - [`recording`]: an in-memory connection that records what it is asked to
//!   do, used for dry runs and tests

pub mod postgres;
pub mod recording;

pub use postgres::{PgConnection, SslMode};
pub use recording::RecordingConnection;
