//! File-backed storage for the token sync job.
//!
//! - [`accounts`] loads the credential batch (the Account Source).
//! - [`writer`] holds the persisted token file and only rewrites it when the
//!   new result set differs (the Change-Gated Writer).

pub mod accounts;
pub mod error;
pub mod writer;

pub use accounts::{AccountSource, JsonAccountFile};
pub use error::StoreError;
pub use writer::{ChangeGatedWriter, CommitOutcome};
