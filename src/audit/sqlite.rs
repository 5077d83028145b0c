//! Audit log: SQLite-based operation history.
//!
//! Stores a row for every audit event (logins, token checks, secret
//! writes) in a local SQLite database, typically `<data_dir>/audit.db`.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::{AuditEvent, AuditSink};
use crate::errors::{KriptoError, Result};

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub subject: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit sink.
pub struct SqliteAuditLog {
    conn: Mutex<Connection>,
}

impl SqliteAuditLog {
    /// Open (or create) the audit database at `db_path`.
    ///
    /// Returns `None` if the database can't be opened; callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(db_path: &Path) -> Option<Self> {
        let conn = Connection::open(db_path).ok()?;

        // Set restrictive permissions on the audit database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                subject     TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Query recent audit entries, most recent first.
    ///
    /// - `limit`: maximum number of entries to return.
    /// - `since`: if provided, only return entries at or after this time.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let since_str = since.map(|ts| ts.to_rfc3339());

        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, operation, subject, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| KriptoError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since_str, limit_i64], |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    subject: row.get(3)?,
                    details: row.get(4)?,
                })
            })
            .map_err(|e| KriptoError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| KriptoError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }
}

impl AuditSink for SqliteAuditLog {
    /// Fire-and-forget. Errors are silently ignored.
    fn record(&self, event: &AuditEvent) {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = conn.execute(
            "INSERT INTO audit_log (timestamp, operation, subject, details)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![now, event.operation(), event.subject(), event.details()],
        );
    }
}

impl std::fmt::Debug for SqliteAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAuditLog").finish_non_exhaustive()
    }
}
