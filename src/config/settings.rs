use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use crate::errors::{KriptoError, Result};
use crate::store::StoreLayout;

/// Service configuration, loaded from `kripto.toml`.
///
/// Every field has a default matching the container layout, so Kripto
/// runs without any config file at all. The vault passphrase is never
/// read from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `.<user>.auth` credential files.
    #[serde(default = "default_auth_dir")]
    pub auth_dir: PathBuf,

    /// Directory holding `<app>.secret` bundles.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,

    /// Directory holding the token key pair.
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,

    /// Base name of the key pair (`<keys_dir>/<key_name>` and `.pub`).
    #[serde(default = "default_key_name")]
    pub key_name: String,

    /// Token lifetime for users registered without their own.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    /// SQLite audit database. No audit database when unset.
    #[serde(default)]
    pub audit_db: Option<PathBuf>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_auth_dir() -> PathBuf {
    PathBuf::from("/data/authdb")
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from("/data/secrets")
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("/data/rsa")
}

fn default_key_name() -> String {
    "kripto".to_string()
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth_dir: default_auth_dir(),
            secrets_dir: default_secrets_dir(),
            keys_dir: default_keys_dir(),
            key_name: default_key_name(),
            token_ttl_secs: default_token_ttl_secs(),
            audit_db: None,
        }
    }
}

impl Settings {
    /// Name of the config file the CLI looks for by default.
    pub const FILE_NAME: &'static str = "kripto.toml";

    /// Load settings from `config_path`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KriptoError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if !(1..=MAX_TOKEN_TTL_SECS).contains(&settings.token_ttl_secs) {
            return Err(KriptoError::ConfigError(format!(
                "token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS} in {}",
                config_path.display()
            )));
        }

        Ok(settings)
    }

    /// Every directory rooted under `root`, keeping the other fields.
    ///
    /// Example: `root/authdb`, `root/secrets`, `root/rsa`.
    #[must_use]
    pub fn rooted_at(self, root: &Path) -> Self {
        let layout = StoreLayout::under(root);
        Self {
            auth_dir: layout.auth_dir,
            secrets_dir: layout.secrets_dir,
            keys_dir: layout.keys_dir,
            ..self
        }
    }

    /// The file store layout these settings describe.
    pub fn layout(&self) -> StoreLayout {
        StoreLayout {
            auth_dir: self.auth_dir.clone(),
            secrets_dir: self.secrets_dir.clone(),
            keys_dir: self.keys_dir.clone(),
        }
    }

    /// Saturates for values [`load`](Self::load) would have rejected, so
    /// issuing with them fails instead of panicking.
    pub fn token_ttl(&self) -> Duration {
        Duration::try_seconds(self.token_ttl_secs).unwrap_or(Duration::MAX)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_match_container_layout() {
        let s = Settings::default();
        assert_eq!(s.auth_dir, PathBuf::from("/data/authdb"));
        assert_eq!(s.secrets_dir, PathBuf::from("/data/secrets"));
        assert_eq!(s.keys_dir, PathBuf::from("/data/rsa"));
        assert_eq!(s.key_name, "kripto");
        assert_eq!(s.token_ttl(), Duration::hours(24));
        assert!(s.audit_db.is_none());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join(Settings::FILE_NAME)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
auth_dir = "/srv/kripto/auth"
secrets_dir = "/srv/kripto/secrets"
keys_dir = "/srv/kripto/keys"
key_name = "signer"
token_ttl_secs = 3600
audit_db = "/srv/kripto/audit.db"
"#;
        let path = tmp.path().join(Settings::FILE_NAME);
        fs::write(&path, config).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.auth_dir, PathBuf::from("/srv/kripto/auth"));
        assert_eq!(settings.key_name, "signer");
        assert_eq!(settings.token_ttl(), Duration::hours(1));
        assert_eq!(
            settings.audit_db,
            Some(PathBuf::from("/srv/kripto/audit.db"))
        );
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(Settings::FILE_NAME);
        fs::write(&path, "key_name = \"other\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.key_name, "other");
        // Rest should be defaults
        assert_eq!(settings.secrets_dir, PathBuf::from("/data/secrets"));
        assert_eq!(settings.token_ttl_secs, 86_400);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(Settings::FILE_NAME);
        fs::write(&path, "not valid {{toml").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(KriptoError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_non_positive_ttl() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(Settings::FILE_NAME);
        fs::write(&path, "token_ttl_secs = 0\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn load_rejects_ttl_beyond_the_cap() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(Settings::FILE_NAME);
        fs::write(&path, "token_ttl_secs = 9223372036854775807\n").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(KriptoError::ConfigError(_))
        ));
    }

    #[test]
    fn unchecked_huge_ttl_saturates_instead_of_panicking() {
        let s = Settings {
            token_ttl_secs: i64::MAX,
            ..Settings::default()
        };
        assert_eq!(s.token_ttl(), Duration::MAX);
    }

    #[test]
    fn rooted_at_moves_every_directory() {
        let s = Settings::default().rooted_at(Path::new("/tmp/k"));
        assert_eq!(s.layout(), StoreLayout::under(Path::new("/tmp/k")));
        assert_eq!(s.key_name, "kripto");
    }
}
