//! Audit events and the sinks that receive them.
//!
//! Every component takes an `Arc<dyn AuditSink>` in its constructor
//! instead of reaching for a process-wide logger. The default sink
//! forwards to `tracing`; the binary can add a SQLite-backed log
//! (feature `audit-log`) and tests can capture events in memory.
//!
//! Events never carry passwords, passphrases, tokens or secret values.

#[cfg(feature = "audit-log")]
mod sqlite;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[cfg(feature = "audit-log")]
pub use sqlite::{AuditEntry, SqliteAuditLog};

/// Something security-relevant that happened inside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    UserRegistered {
        username: String,
    },
    UserRemoved {
        username: String,
    },
    LoginSucceeded {
        username: String,
    },
    LoginFailed {
        username: String,
        reason: &'static str,
    },
    TokenIssued {
        username: String,
        expires_at: DateTime<Utc>,
    },
    TokenAccepted {
        username: String,
        expires_at: DateTime<Utc>,
    },
    TokenRejected {
        reason: String,
    },
    SecretWritten {
        app: String,
        vars: usize,
    },
    SecretRead {
        app: String,
        found: bool,
    },
    SecretDeleted {
        app: String,
    },
}

impl AuditEvent {
    /// Short operation tag, e.g. `"token.rejected"`.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user.registered",
            Self::UserRemoved { .. } => "user.removed",
            Self::LoginSucceeded { .. } => "login.succeeded",
            Self::LoginFailed { .. } => "login.failed",
            Self::TokenIssued { .. } => "token.issued",
            Self::TokenAccepted { .. } => "token.accepted",
            Self::TokenRejected { .. } => "token.rejected",
            Self::SecretWritten { .. } => "secret.written",
            Self::SecretRead { .. } => "secret.read",
            Self::SecretDeleted { .. } => "secret.deleted",
        }
    }

    /// The user or app the event is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::UserRegistered { username }
            | Self::UserRemoved { username }
            | Self::LoginSucceeded { username }
            | Self::LoginFailed { username, .. }
            | Self::TokenIssued { username, .. }
            | Self::TokenAccepted { username, .. } => Some(username),
            Self::SecretWritten { app, .. }
            | Self::SecretRead { app, .. }
            | Self::SecretDeleted { app } => Some(app),
            Self::TokenRejected { .. } => None,
        }
    }

    /// Free-form detail for the audit row.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::LoginFailed { reason, .. } => Some((*reason).to_string()),
            Self::TokenIssued { expires_at, .. } | Self::TokenAccepted { expires_at, .. } => {
                Some(format!("expires_at={}", expires_at.to_rfc3339()))
            }
            Self::TokenRejected { reason } => Some(reason.clone()),
            Self::SecretWritten { vars, .. } => Some(format!("vars={vars}")),
            Self::SecretRead { found, .. } => Some(format!("found={found}")),
            Self::UserRegistered { .. }
            | Self::UserRemoved { .. }
            | Self::LoginSucceeded { .. }
            | Self::SecretDeleted { .. } => None,
        }
    }
}

/// Receiver for audit events. Must never fail the calling operation.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Forwards events to `tracing`. Rejections and failed logins are warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: &AuditEvent) {
        let op = event.operation();
        let subject = event.subject().unwrap_or("-");
        let details = event.details().unwrap_or_default();

        match event {
            AuditEvent::LoginFailed { .. } | AuditEvent::TokenRejected { .. } => {
                warn!(op, subject, details = %details, "audit");
            }
            _ => info!(op, subject, details = %details, "audit"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _event: &AuditEvent) {}
}

/// Keeps events in memory, in order. Handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Operation tags recorded so far.
    pub fn operations(&self) -> Vec<&'static str> {
        self.events().iter().map(AuditEvent::operation).collect()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Sends every event to each sink in turn.
#[derive(Default, Clone)]
pub struct AuditChain {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for AuditChain {
    fn record(&self, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

impl std::fmt::Debug for AuditChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditChain")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
