//! ResultSink trait - persistence interface for classified results

use crate::{ContractError, ExchangeResult};

/// Result output trait
///
/// One sink consumes exactly one sub-stream (failures or successes).
#[trait_variant::make(ResultSink: Send)]
pub trait LocalResultSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one result
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, result: &ExchangeResult) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
