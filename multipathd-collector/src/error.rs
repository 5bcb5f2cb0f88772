//! Error types for collecting multipathd status.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The daemon's report could not be obtained.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The status command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The status command ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The status command did not finish in time and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// A status file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The report was not valid JSON for the status schema.
#[derive(Debug, Error)]
#[error("failed to decode multipathd status: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Errors that abort one collection.
///
/// Either is terminal for that scrape: no samples are produced.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
