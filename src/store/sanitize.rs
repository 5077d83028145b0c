use crate::errors::{KriptoError, Result};

/// Reduce an externally supplied name to `[A-Za-z0-9]`.
///
/// Separators, dots, NUL bytes and non-ASCII letters are all dropped, so
/// the result can never name a parent directory or escape the base path.
pub fn sanitize(name: &str) -> Result<String> {
    let clean: String = name.chars().filter(char::is_ascii_alphanumeric).collect();

    if clean.is_empty() {
        return Err(KriptoError::InvalidName(name.to_string()));
    }

    Ok(clean)
}
