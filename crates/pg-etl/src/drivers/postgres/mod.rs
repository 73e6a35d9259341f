//! PostgreSQL driver.
//!
//! - [`PgConnection`]: single-session [`Connection`](crate::core::Connection)
//! - [`SslMode`]: `sslmode` parsing and rustls connector setup

mod connection;
mod tls;

pub use connection::PgConnection;
pub use tls::SslMode;
