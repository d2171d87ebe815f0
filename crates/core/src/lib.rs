//! Shared domain types for the token sync service.
//!
//! Zero internal dependencies: every other workspace crate builds on these
//! types, so they stay plain data plus validation.

pub mod account;
pub mod constants;
pub mod error;
pub mod token;

pub use account::{validate_batch, Account};
pub use error::CoreError;
pub use token::{canonicalize, FetchedToken, ResultSet, TokenRecord};
