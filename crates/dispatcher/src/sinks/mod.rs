//! Sink implementations

mod file;

pub use self::file::{format_record, FileSink, RECORD_DELIMITER};
