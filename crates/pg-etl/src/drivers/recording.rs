//! In-memory connection that records statements instead of executing them.
//!
//! Backs the CLI's `--dry-run` mode and the crate's tests. Every statement
//! and every bulk-load payload is kept in order; statements containing a
//! configured pattern are rejected so failure paths can be exercised.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::core::traits::{Connection, CopyChannel};
use crate::error::ConnectionError;

/// A bulk load received by a [`RecordingConnection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedCopy {
    /// The `COPY ... FROM STDIN` command.
    pub command: String,
    /// Bytes sent, in order.
    pub data: Vec<u8>,
    /// Whether the load was finished (as opposed to dropped).
    pub finished: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    statements: Vec<String>,
    copies: Vec<RecordedCopy>,
}

/// Connection that records instead of executing.
#[derive(Debug, Default, Clone)]
pub struct RecordingConnection {
    recorded: Arc<Mutex<Recorded>>,
    reject_patterns: Vec<String>,
    fail_finish: Option<String>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any statement (including COPY commands) containing `pattern`.
    pub fn rejecting(mut self, pattern: impl Into<String>) -> Self {
        self.reject_patterns.push(pattern.into());
        self
    }

    /// Make every bulk load fail when finished, as a server would on bad data.
    pub fn failing_finish(mut self, message: impl Into<String>) -> Self {
        self.fail_finish = Some(message.into());
        self
    }

    /// Statements issued so far, COPY commands included, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Bulk loads opened so far, in order.
    pub fn copies(&self) -> Vec<RecordedCopy> {
        self.lock().copies.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A poisoned lock only means a test panicked mid-record.
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, sql: &str) -> Result<(), ConnectionError> {
        self.lock().statements.push(sql.to_string());
        match self.reject_patterns.iter().find(|p| sql.contains(p.as_str())) {
            Some(pattern) => Err(ConnectionError::Rejected(format!(
                "statement rejected (matched {:?})",
                pattern
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(&self, sql: &str) -> Result<u64, ConnectionError> {
        info!("{}", sql);
        self.record(sql)?;
        Ok(0)
    }

    async fn copy_in(&self, sql: &str) -> Result<Box<dyn CopyChannel>, ConnectionError> {
        info!("{}", sql);
        self.record(sql)?;
        let index = {
            let mut recorded = self.lock();
            recorded.copies.push(RecordedCopy {
                command: sql.to_string(),
                ..Default::default()
            });
            recorded.copies.len() - 1
        };
        Ok(Box::new(RecordingChannel {
            connection: self.clone(),
            index,
            skip_header: sql.contains(" HEADER "),
        }))
    }
}

struct RecordingChannel {
    connection: RecordingConnection,
    index: usize,
    skip_header: bool,
}

#[async_trait]
impl CopyChannel for RecordingChannel {
    async fn send(&mut self, chunk: Bytes) -> Result<(), ConnectionError> {
        self.connection.lock().copies[self.index]
            .data
            .extend_from_slice(&chunk);
        Ok(())
    }

    /// Reports the number of non-empty lines as the row count.
    ///
    /// This is an estimate: a quoted field spanning lines counts once per line.
    async fn finish(&mut self) -> Result<u64, ConnectionError> {
        if let Some(message) = &self.connection.fail_finish {
            return Err(ConnectionError::Rejected(message.clone()));
        }
        let mut recorded = self.connection.lock();
        let copy = &mut recorded.copies[self.index];
        copy.finished = true;
        let lines = copy
            .data
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty() && *line != b"\r")
            .count() as u64;
        Ok(if self.skip_header {
            lines.saturating_sub(1)
        } else {
            lines
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_statements_in_order() {
        let conn = RecordingConnection::new();
        conn.execute("SELECT 1").await.unwrap();
        conn.execute("SELECT 2").await.unwrap();
        assert_eq!(conn.statements(), vec!["SELECT 1", "SELECT 2"]);
    }

    #[tokio::test]
    async fn test_rejects_matching_statement_but_records_it() {
        let conn = RecordingConnection::new().rejecting("DROP");
        let err = conn.execute("DROP TABLE x").await.unwrap_err();
        assert!(err.to_string().contains("rejected"));
        assert_eq!(conn.statements(), vec!["DROP TABLE x"]);
    }

    #[tokio::test]
    async fn test_copy_channel_records_payload() {
        let conn = RecordingConnection::new();
        let mut channel = conn
            .copy_in("COPY \"t\" FROM STDIN CSV HEADER DELIMITER ','")
            .await
            .unwrap();
        channel.send(Bytes::from_static(b"a,b\n1,2\n")).await.unwrap();
        channel.send(Bytes::from_static(b"3,4\n")).await.unwrap();
        assert_eq!(channel.finish().await.unwrap(), 2);

        let copies = conn.copies();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].data, b"a,b\n1,2\n3,4\n");
        assert!(copies[0].finished);
    }

    #[tokio::test]
    async fn test_dropped_channel_is_not_finished() {
        let conn = RecordingConnection::new();
        {
            let mut channel = conn.copy_in("COPY \"t\" FROM STDIN CSV").await.unwrap();
            channel.send(Bytes::from_static(b"1\n")).await.unwrap();
        }
        assert!(!conn.copies()[0].finished);
    }

    #[tokio::test]
    async fn test_failing_finish() {
        let conn = RecordingConnection::new().failing_finish("invalid input syntax");
        let mut channel = conn.copy_in("COPY \"t\" FROM STDIN CSV").await.unwrap();
        let err = channel.finish().await.unwrap_err();
        assert_eq!(err.to_string(), "invalid input syntax");
    }
}
