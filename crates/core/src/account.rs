//! Account credentials used to request one token each.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A credential pair. Identity is `uid`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub uid: String,
    pub password: String,
}

impl Account {
    pub fn new(uid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("uid", &self.uid)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validate a freshly loaded credential batch.
///
/// Rules:
/// - `uid` must not be empty or whitespace.
/// - `password` must not be empty.
///
/// Duplicate uids are allowed; each entry is fetched independently.
pub fn validate_batch(accounts: &[Account]) -> Result<(), CoreError> {
    for (index, account) in accounts.iter().enumerate() {
        if account.uid.trim().is_empty() {
            return Err(CoreError::InvalidAccount {
                index,
                reason: "uid is empty".to_string(),
            });
        }
        if account.password.is_empty() {
            return Err(CoreError::InvalidAccount {
                index,
                reason: format!("password is empty for uid {}", account.uid),
            });
        }
    }
    Ok(())
}
