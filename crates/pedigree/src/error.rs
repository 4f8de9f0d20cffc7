//! Error types for pedigree operations.
//!
//! [`PedigreeError`] is the only error that leaves the crate. Fetch failures
//! during expansion rounds are absorbed by the expander and never surface
//! here; only a failed initial load does.

use std::{io, time::Duration};

use thiserror::Error;

/// Failure of a round trip to an external record collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record store rejected the request: {0}")]
    Rejected(String),

    #[error("round exceeded its deadline after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

/// The main error type for pedigree operations.
#[derive(Debug, Error)]
pub enum PedigreeError {
    #[error("Failed to load owned individuals: {0}")]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid record data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(String),
}
