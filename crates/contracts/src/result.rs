//! ExchangeResult - classified outcome of one completed HTTP exchange

use std::time::Duration;

use bytes::Bytes;

use crate::SUCCESS_STATUS;

/// One completed request/response pair
///
/// `request` and `response` hold the wire-format text of the exchange
/// (start line, headers, blank line, body).
#[derive(Debug, Clone)]
pub struct ExchangeResult {
    /// Index of the job that produced this result
    pub job_index: usize,
    /// Serialized request
    pub request: Bytes,
    /// Serialized response
    pub response: Bytes,
    /// Response status code
    pub status: u16,
    /// Whether the status was not the expected success status
    pub is_failure: bool,
    /// Time from issuing the call to reading the full response
    pub elapsed: Duration,
}

impl ExchangeResult {
    /// Build a result, classifying it from `status`
    pub fn new(
        job_index: usize,
        request: Bytes,
        response: Bytes,
        status: u16,
        elapsed: Duration,
    ) -> Self {
        Self {
            job_index,
            request,
            response,
            status,
            is_failure: is_failure_status(status),
            elapsed,
        }
    }
}

/// Classification rule: anything other than the success status is a failure
pub fn is_failure_status(status: u16) -> bool {
    status != SUCCESS_STATUS
}
