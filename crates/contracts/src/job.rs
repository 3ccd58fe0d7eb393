//! Job - one outbound request body

use serde_json::{Map, Value};

/// JSON object used as a request body
pub type JsonObject = Map<String, Value>;

/// A single request payload
///
/// Immutable once enqueued. `index` is the position of the payload in the
/// input collection and is the stable key for ordering results after the fact.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Zero-based position in the input collection
    pub index: usize,
    /// Request body
    pub payload: JsonObject,
}

impl Job {
    /// Create a job from its index and payload
    pub fn new(index: usize, payload: JsonObject) -> Self {
        Self { index, payload }
    }

    /// Tag a collection of payloads with their positions
    pub fn from_payloads(payloads: impl IntoIterator<Item = JsonObject>) -> Vec<Job> {
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| Job::new(index, payload))
            .collect()
    }

    /// Serialize the payload to the request body
    pub fn body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.payload)
    }
}
