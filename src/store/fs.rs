//! The file store itself: path layout, locked access, atomic writes.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::lock::KeyLocks;
use super::sanitize::sanitize;
use crate::errors::{KriptoError, Result};

/// What a stored file holds. Decides the base directory and file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Encrypted credential record: `.<name>.auth`.
    Credential,
    /// Encrypted secret bundle: `<name>.secret`.
    Secret,
    /// Signing key: bare `<name>`.
    PrivateKey,
    /// Verification key: `<name>.pub`.
    PublicKey,
}

impl FileKind {
    /// File name for an already-sanitized logical name.
    fn file_name(self, clean: &str) -> String {
        match self {
            Self::Credential => format!(".{clean}.auth"),
            Self::Secret => format!("{clean}.secret"),
            Self::PrivateKey => clean.to_string(),
            Self::PublicKey => format!("{clean}.pub"),
        }
    }

    /// Inverse of `file_name`: recover the logical name, if this file is ours.
    fn logical_name(self, file_name: &str) -> Option<String> {
        let stem = match self {
            Self::Credential => file_name.strip_prefix('.')?.strip_suffix(".auth")?,
            Self::Secret => file_name.strip_suffix(".secret")?,
            Self::PrivateKey => file_name,
            Self::PublicKey => file_name.strip_suffix(".pub")?,
        };

        let valid = !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_alphanumeric());
        valid.then(|| stem.to_string())
    }
}

/// Base directories for each file kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub auth_dir: PathBuf,
    pub secrets_dir: PathBuf,
    pub keys_dir: PathBuf,
}

impl StoreLayout {
    /// Conventional layout under a single root: `authdb/`, `secrets/`, `rsa/`.
    pub fn under(root: &Path) -> Self {
        Self {
            auth_dir: root.join("authdb"),
            secrets_dir: root.join("secrets"),
            keys_dir: root.join("rsa"),
        }
    }

    /// Base directory for a kind.
    pub fn dir(&self, kind: FileKind) -> &Path {
        match kind {
            FileKind::Credential => &self.auth_dir,
            FileKind::Secret => &self.secrets_dir,
            FileKind::PrivateKey | FileKind::PublicKey => &self.keys_dir,
        }
    }
}

/// Sanitizing, per-key-locked file store.
///
/// Share one instance (behind an `Arc`) between every component that
/// touches the same directories, otherwise the lock arena cannot see
/// concurrent writers.
#[derive(Debug)]
pub struct FileStore {
    layout: StoreLayout,
    locks: KeyLocks,
}

impl FileStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            locks: KeyLocks::new(),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Full path for `name` of `kind`. Fails if `name` sanitizes to nothing.
    pub fn path_for(&self, kind: FileKind, name: &str) -> Result<PathBuf> {
        let clean = sanitize(name)?;
        Ok(self.layout.dir(kind).join(kind.file_name(&clean)))
    }

    /// Run `f` with exclusive access to one stored file.
    ///
    /// Use this when a caller needs several steps (check, then delete) to
    /// happen without another writer slipping in between. The entry's own
    /// methods do not lock again.
    pub fn entry<T>(
        &self,
        kind: FileKind,
        name: &str,
        f: impl FnOnce(&LockedEntry<'_>) -> Result<T>,
    ) -> Result<T> {
        let path = self.path_for(kind, name)?;
        self.locks.with(&path, || {
            let entry = LockedEntry {
                dir: self.layout.dir(kind),
                path: &path,
            };
            f(&entry)
        })
    }

    /// Create or fully replace the file.
    pub fn write(&self, kind: FileKind, name: &str, data: &[u8]) -> Result<()> {
        self.entry(kind, name, |e| e.write(data))
    }

    /// Raw file bytes, or `None` when no such file exists.
    pub fn read(&self, kind: FileKind, name: &str) -> Result<Option<Vec<u8>>> {
        self.entry(kind, name, |e| e.read())
    }

    pub fn exists(&self, kind: FileKind, name: &str) -> Result<bool> {
        self.entry(kind, name, |e| Ok(e.exists()))
    }

    /// Remove the file. A missing file is [`KriptoError::NotFound`].
    pub fn delete(&self, kind: FileKind, name: &str) -> Result<()> {
        self.entry(kind, name, |e| e.delete())
    }

    /// Logical names currently stored for `kind`, sorted.
    ///
    /// Files that do not follow the kind's naming convention (temp files,
    /// other kinds sharing the directory) are skipped.
    pub fn list(&self, kind: FileKind) -> Result<Vec<String>> {
        let dir = self.layout.dir(kind);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = kind.logical_name(file_name) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Recursively remove every base directory.
    ///
    /// Administrative / test teardown only.
    pub fn drop_all(&self) -> Result<()> {
        let mut dirs = vec![
            &self.layout.auth_dir,
            &self.layout.secrets_dir,
            &self.layout.keys_dir,
        ];
        dirs.sort();
        dirs.dedup();

        for dir in dirs {
            match fs::remove_dir_all(dir) {
                Ok(()) => debug!(dir = %dir.display(), "removed store directory"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// A stored file while its key lock is held.
#[derive(Debug)]
pub struct LockedEntry<'a> {
    dir: &'a Path,
    path: &'a Path,
}

impl LockedEntry<'_> {
    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic replace: write a temp file beside the target, then rename.
    ///
    /// Readers see either the old contents or the new, never a mix.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        fs::create_dir_all(self.dir)?;

        let tmp_path = self.dir.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        let written = write_private(&tmp_path, data).and_then(|()| fs::rename(&tmp_path, self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), bytes = data.len(), "stored file written");
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "stored file removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(KriptoError::NotFound(self.path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Create `path` owner-read/write only and fill it with `data`.
fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
