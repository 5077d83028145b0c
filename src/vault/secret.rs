//! The unit of storage in the vault: one app's environment variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{KriptoError, Result};

/// All variables stored for one application.
///
/// `vars` is a `BTreeMap` so the serialized form is canonical: the same
/// bundle always encodes to the same JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBundle {
    pub app: String,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl SecretBundle {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Parse the JSON payload a caller submits, e.g.
    /// `{"app":"svc","vars":{"DB_URL":"postgres://..."}}`.
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| KriptoError::Serialization(format!("secret bundle: {e}")))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| KriptoError::Serialization(format!("secret bundle: {e}")))
    }
}
