//! `kripto audit`: display the audit log.
//!
//! Usage:
//!   kripto audit               # show last 50 entries
//!   kripto audit --last 20     # show last 20
//!   kripto audit --since 7d    # entries from last 7 days
//!
//! Needs `audit_db` in the config and the `audit-log` feature.

use crate::cli::Cli;
use crate::errors::{KriptoError, Result};

#[cfg(feature = "audit-log")]
use crate::audit::{AuditEntry, SqliteAuditLog};
#[cfg(feature = "audit-log")]
use crate::cli::{load_settings, output, parse_duration};

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let settings = load_settings(cli)?;
    let db_path = settings.audit_db.ok_or_else(|| {
        KriptoError::AuditError("no audit_db configured in the config file".into())
    })?;

    let audit = SqliteAuditLog::open(&db_path)
        .ok_or_else(|| KriptoError::AuditError("failed to open audit database".into()))?;

    let since_dt = match since {
        Some(s) => Some(since_cutoff(chrono::Utc::now(), s)?),
        None => None,
    };

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// `now` minus the `--since` duration.
#[cfg(feature = "audit-log")]
fn since_cutoff(
    now: chrono::DateTime<chrono::Utc>,
    since: &str,
) -> Result<chrono::DateTime<chrono::Utc>> {
    now.checked_sub_signed(parse_duration(since)?)
        .ok_or_else(|| KriptoError::CommandFailed(format!("--since {since} reaches too far back")))
}

#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, _since: Option<&str>) -> Result<()> {
    Err(KriptoError::AuditError(
        "built without the audit-log feature".into(),
    ))
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Subject", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let subject = entry.subject.as_deref().unwrap_or("-");
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![time, op, subject.to_string(), details.to_string()]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "user.registered" | "login.succeeded" | "token.accepted" => style(op).green().to_string(),
        "secret.written" | "token.issued" => style(op).blue().to_string(),
        "user.removed" | "secret.deleted" => style(op).red().to_string(),
        "login.failed" | "token.rejected" => style(op).yellow().to_string(),
        "secret.read" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
