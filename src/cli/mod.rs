//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use clap::Parser;
use zeroize::Zeroizing;

use crate::audit::{AuditChain, AuditSink, TracingAudit};
use crate::config::Settings;
use crate::errors::{KriptoError, Result};
use crate::service::Kripto;

/// Kripto CLI: encrypted secret store with password login and bearer tokens.
#[derive(Parser)]
#[command(
    name = "kripto",
    about = "Encrypted secret store with password login and signed bearer tokens",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: kripto.toml)
    #[arg(long, env = "KRIPTO_CONFIG", default_value = Settings::FILE_NAME, global = true)]
    pub config: PathBuf,

    /// Put authdb/, secrets/ and rsa/ under this directory instead
    #[arg(long, env = "KRIPTO_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Vault passphrase (omit for interactive prompt)
    #[arg(long, env = "KRIPTO_PASSPHRASE", hide_env_values = true, global = true)]
    pub passphrase: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Manage users (add, remove, check, list)
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Issue and verify bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Store and fetch secret bundles (requires a token)
    Secret {
        /// Bearer token from `kripto token issue`
        #[arg(long, env = "KRIPTO_TOKEN", hide_env_values = true, global = true)]
        token: Option<String>,

        #[command(subcommand)]
        action: SecretAction,
    },

    /// View the audit log
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

/// User subcommands.
#[derive(clap::Subcommand)]
pub enum UserAction {
    /// Register a user (password from KRIPTO_PASSWORD or prompt)
    Add {
        username: String,
        /// Lifetime of this user's tokens (e.g. 200m, 12h, 7d)
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Remove a user
    Remove {
        username: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check a user's password
    Check { username: String },

    /// List registered users
    List,
}

/// Token subcommands.
#[derive(clap::Subcommand)]
pub enum TokenAction {
    /// Log in and print a token
    Issue { username: String },

    /// Check a token and show who it belongs to
    Verify { token: String },
}

/// Secret subcommands.
#[derive(clap::Subcommand)]
pub enum SecretAction {
    /// Store an app's variables, replacing what was there
    Put {
        app: String,
        /// Variables as KEY=VALUE
        vars: Vec<String>,
    },

    /// Show an app's variables
    Get {
        app: String,
        /// Print the bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an app's bundle
    Delete {
        app: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List apps with stored bundles
    List,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config`, then apply `--data-dir`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = Settings::load(&cli.config)?;
    Ok(match &cli.data_dir {
        Some(root) => settings.rooted_at(root),
        None => settings,
    })
}

/// Build the core with `tracing` auditing plus the SQLite log if configured.
pub fn open_core(cli: &Cli) -> Result<Kripto> {
    let settings = load_settings(cli)?;
    let audit = audit_sink(&settings);
    Ok(Kripto::new(&settings, audit))
}

fn audit_sink(settings: &Settings) -> Arc<dyn AuditSink> {
    let chain = AuditChain::new().with(Arc::new(TracingAudit));

    #[cfg(feature = "audit-log")]
    if let Some(path) = &settings.audit_db {
        match crate::audit::SqliteAuditLog::open(path) {
            Some(log) => return Arc::new(chain.with(Arc::new(log))),
            None => output::warning(&format!(
                "audit database {} unavailable, continuing without it",
                path.display()
            )),
        }
    }

    #[cfg(not(feature = "audit-log"))]
    let _ = settings;

    Arc::new(chain)
}

/// Get the vault passphrase, trying in order:
/// 1. `--passphrase` / `KRIPTO_PASSPHRASE`
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn passphrase(cli: &Cli) -> Result<Zeroizing<String>> {
    if let Some(p) = cli.passphrase.as_deref().filter(|p| !p.is_empty()) {
        return Ok(Zeroizing::new(p.to_string()));
    }

    let p = dialoguer::Password::new()
        .with_prompt("Enter vault passphrase")
        .interact()
        .map_err(|e| KriptoError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(p))
}

/// Get a user's password from `KRIPTO_PASSWORD` or an interactive prompt.
pub fn prompt_password(username: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()
        .map_err(|e| KriptoError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used by `user add`).
///
/// Also respects `KRIPTO_PASSWORD` for scripted usage.
pub fn prompt_new_password(username: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(format!("Choose password for {username}"))
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| KriptoError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var("KRIPTO_PASSWORD")
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// The token a `secret` command runs with.
pub fn require_token(token: Option<&str>) -> Result<&str> {
    token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        KriptoError::CommandFailed(
            "no token given: pass --token or set KRIPTO_TOKEN (see `kripto token issue`)".into(),
        )
    })
}

/// Parse a human-friendly duration like "90s", "200m", "24h", "7d".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let invalid = || {
        KriptoError::CommandFailed(format!(
            "invalid duration '{input}' (use a whole number followed by s, m, h or d)"
        ))
    };

    let unit = input.chars().last().ok_or_else(invalid)?;
    let num: i64 = input[..input.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if num <= 0 {
        return Err(invalid());
    }

    let duration = match unit {
        's' => Duration::try_seconds(num),
        'm' => Duration::try_minutes(num),
        'h' => Duration::try_hours(num),
        'd' => Duration::try_days(num),
        _ => return Err(invalid()),
    };
    duration.ok_or_else(|| {
        KriptoError::CommandFailed(format!("duration '{input}' is too large"))
    })
}

/// Split `KEY=VALUE` arguments into pairs. Values may contain `=`.
pub fn parse_assignments(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(KriptoError::CommandFailed(format!(
                "'{arg}' is not KEY=VALUE"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_in_every_unit() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("200m").unwrap(), Duration::minutes(200));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration(" 7d ").unwrap(), Duration::days(7));
    }

    #[test]
    fn bad_durations() {
        for input in ["", "d", "abc", "7x", "0h", "-5m", "1.5h", "5é"] {
            assert!(parse_duration(input).is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn oversized_durations_are_errors() {
        for input in ["200000000000000d", "9223372036854775807s", "9223372036854775807h"] {
            let err = parse_duration(input).unwrap_err();
            assert!(err.to_string().contains("too large"), "{input}: {err}");
        }
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let args = vec!["A=1".to_string(), "URL=postgres://u:p@h/db?x=y".to_string(), "EMPTY=".to_string()];
        let pairs = parse_assignments(&args).unwrap();
        assert_eq!(pairs[1].1, "postgres://u:p@h/db?x=y");
        assert_eq!(pairs[2], ("EMPTY".to_string(), String::new()));
    }

    #[test]
    fn assignments_need_a_key() {
        assert!(parse_assignments(&["=v".to_string()]).is_err());
        assert!(parse_assignments(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn missing_token_is_reported() {
        assert!(require_token(None).is_err());
        assert!(require_token(Some("  ")).is_err());
        assert_eq!(require_token(Some("a.b.c")).unwrap(), "a.b.c");
    }
}
