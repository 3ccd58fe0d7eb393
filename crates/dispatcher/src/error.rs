//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A sink failed to persist a result; the run is aborted
    #[error("sink '{sink_name}' failed: {source}")]
    SinkWrite {
        sink_name: String,
        #[source]
        source: contracts::ContractError,
    },

    /// HTTP client construction error
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Worker, aggregator or sink task panicked
    #[error("task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl DispatchError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(sink_name: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            source,
        }
    }
}
