//! Error types for CLI operations.

use thiserror::Error;

/// Run outcomes that end the process with a non-zero status
#[derive(Error, Debug)]
pub enum CliError {
    /// A transport error cancelled the run
    #[error("run cancelled after a transport error: {unprocessed} of {total} jobs not sent")]
    RunCancelled { unprocessed: usize, total: usize },

    /// The user interrupted the run
    #[error("run interrupted: {unprocessed} of {total} jobs not sent")]
    Interrupted { unprocessed: usize, total: usize },

    /// Interactive input was needed but disabled
    #[error("missing required value(s): {fields}")]
    MissingValues { fields: String },
}

impl CliError {
    pub fn run_cancelled(unprocessed: usize, total: usize) -> Self {
        Self::RunCancelled { unprocessed, total }
    }

    pub fn interrupted(unprocessed: usize, total: usize) -> Self {
        Self::Interrupted { unprocessed, total }
    }

    pub fn missing_values(fields: &[&str]) -> Self {
        Self::MissingValues {
            fields: fields.join(", "),
        }
    }
}
