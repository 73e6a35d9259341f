//! PostgreSQL implementation of the [`Connection`] capability.
//!
//! Wraps a single `tokio_postgres::Client` session. Temporary tables created
//! during an import live in this session, so one session serves a whole
//! pipeline run.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use tokio_postgres::{Client, Config as PgConfig, CopyInSink, NoTls};
use tracing::{debug, error, info};

use super::tls::SslMode;
use crate::config::TargetConfig;
use crate::core::traits::{Connection, CopyChannel};
use crate::error::{ConnectionError, EtlError, Result};

/// Connect timeout for the session.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single PostgreSQL session.
pub struct PgConnection {
    client: Client,
}

impl PgConnection {
    /// Open a session to the configured target.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name(&config.application_name);
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(CONNECT_TIMEOUT);

        let connect_err = |e: tokio_postgres::Error| EtlError::Connect(e.into());

        let client = match SslMode::parse(&config.ssl_mode)?.connector()? {
            None => {
                let (client, connection) = pg_config.connect(NoTls).await.map_err(connect_err)?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("PostgreSQL connection error: {}", e);
                    }
                });
                client
            }
            Some(tls) => {
                let (client, connection) = pg_config.connect(tls).await.map_err(connect_err)?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("PostgreSQL connection error: {}", e);
                    }
                });
                client
            }
        };

        info!(
            "Connected to PostgreSQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(&self, sql: &str) -> std::result::Result<u64, ConnectionError> {
        debug!("Executing: {}", sql);
        Ok(self.client.execute(sql, &[]).await?)
    }

    async fn copy_in(&self, sql: &str) -> std::result::Result<Box<dyn CopyChannel>, ConnectionError> {
        debug!("Starting bulk load: {}", sql);
        let sink = self.client.copy_in::<_, Bytes>(sql).await?;
        Ok(Box::new(PgCopyChannel {
            sink: Box::pin(sink),
        }))
    }
}

/// `COPY ... FROM STDIN` sink. Dropping it unfinished aborts the COPY.
struct PgCopyChannel {
    sink: Pin<Box<CopyInSink<Bytes>>>,
}

#[async_trait]
impl CopyChannel for PgCopyChannel {
    async fn send(&mut self, chunk: Bytes) -> std::result::Result<(), ConnectionError> {
        self.sink.send(chunk).await?;
        Ok(())
    }

    async fn finish(&mut self) -> std::result::Result<u64, ConnectionError> {
        Ok(self.sink.as_mut().finish().await?)
    }
}
