//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! - `Job`: one JSON request body, tagged with its position in the input file
//! - `DispatchConfig`: resolved, immutable run parameters
//! - `ExchangeResult`: one completed HTTP exchange, classified success/failure
//! - `ResultSink`: consumer of a classified result sub-stream

mod config;
mod error;
mod job;
mod result;
mod sink;

pub use config::*;
pub use error::*;
pub use job::*;
pub use result::*;
pub use sink::*;
