use std::path::Path;

use thiserror::Error;

/// Errors that can occur in the content-store and compute collaborators
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Content-addressable store holding algorithm and input/output payloads.
/// The ledger core only records the refs and hashes this trait hands back;
/// it never moves payload bytes itself.
pub trait ContentStore {
    /// Uploads a file, returning `(content_ref, content_hash)`.
    fn upload(&self, path: &Path) -> Result<(String, String), ComputeError>;

    /// Downloads the content behind `content_ref` into `dest`.
    fn download(&self, content_ref: &str, dest: &Path) -> Result<(), ComputeError>;
}

/// Runs a committed algorithm against a committed input and reports the
/// digest of the output it produced. Potentially slow, potentially failing;
/// the ledger treats a failure as a verification failure, not a ledger fault.
pub trait ComputeExecutor {
    fn execute(&self, algorithm_ref: &str, input_ref: &str) -> Result<String, ComputeError>;
}
