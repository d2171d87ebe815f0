//! The token sync job: load accounts, fetch tokens, gate on change, publish.
//!
//! - [`JobRunner`] executes one run at a time and never returns an error;
//!   every failure ends the run and is reported as a [`JobOutcome`].
//! - [`scheduler`] drives the runner on a fixed interval until cancelled.
//! - [`JobConfig`] collects the tunables from the environment.

pub mod config;
pub mod job;
pub mod scheduler;

pub use config::JobConfig;
pub use job::{JobError, JobOutcome, JobRunner, Trigger};
