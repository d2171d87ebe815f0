//! Token results and result-set canonicalization.
//!
//! A [`FetchedToken`] remembers which account produced it so the result set
//! can be put in a deterministic order before it is compared against the
//! persisted state. The persisted form ([`TokenRecord`]) carries the token
//! only.

use serde::{Deserialize, Serialize};

/// A token fetched for one account during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub uid: String,
    pub token: String,
}

/// Persisted form of one token: `{"token": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
}

/// Ordered sequence of persisted tokens. Compared positionally.
pub type ResultSet = Vec<TokenRecord>;

impl From<FetchedToken> for TokenRecord {
    fn from(fetched: FetchedToken) -> Self {
        Self {
            token: fetched.token,
        }
    }
}

/// Put fetched tokens into a deterministic order and project them to the
/// persisted form.
///
/// Sorts by `(uid, token)`, so two runs that fetched the same tokens for the
/// same accounts produce equal result sets regardless of completion order.
pub fn canonicalize(mut fetched: Vec<FetchedToken>) -> ResultSet {
    fetched.sort_by(|a, b| a.uid.cmp(&b.uid).then_with(|| a.token.cmp(&b.token)));
    fetched.into_iter().map(TokenRecord::from).collect()
}
