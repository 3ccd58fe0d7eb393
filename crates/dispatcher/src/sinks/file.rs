//! FileSink - appends request/response records to a log file

use std::path::{Path, PathBuf};

use contracts::{ContractError, ExchangeResult, ResultSink};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

/// Line closing every record
pub const RECORD_DELIMITER: &str = "==================================";

/// Sink that writes human-readable exchange records to one file
///
/// The file is created (truncated) when the sink is created, never appended
/// across runs.
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create the output file and the sink
    #[instrument(name = "file_sink_create", skip(name, path), fields(path = %path.as_ref().display()))]
    pub async fn create(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        let name = name.into();
        debug!(sink = %name, path = %path.display(), "FileSink created");

        Ok(Self {
            name,
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Output file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&mut self, record: &[u8]) -> Result<(), ContractError> {
        self.writer
            .write_all(record)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}

/// Render one record
///
/// ```text
/// Request:
/// <request>
/// Response:
/// <response>
/// ==================================
///
/// ```
pub fn format_record(result: &ExchangeResult) -> Vec<u8> {
    let mut record = Vec::with_capacity(result.request.len() + result.response.len() + 64);
    record.extend_from_slice(b"Request:\n");
    record.extend_from_slice(&result.request);
    record.extend_from_slice(b"\nResponse:\n");
    record.extend_from_slice(&result.response);
    record.push(b'\n');
    record.extend_from_slice(RECORD_DELIMITER.as_bytes());
    record.extend_from_slice(b"\n\n");
    record
}

impl ResultSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, result),
        fields(sink = %self.name, job_index = result.job_index)
    )]
    async fn write(&mut self, result: &ExchangeResult) -> Result<(), ContractError> {
        let record = format_record(result);
        self.append(&record).await
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;
    use tempfile::tempdir;

    fn result(request: &'static str, response: &'static str, status: u16) -> ExchangeResult {
        ExchangeResult::new(
            0,
            Bytes::from_static(request.as_bytes()),
            Bytes::from_static(response.as_bytes()),
            status,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_format_record() {
        let record = format_record(&result("REQ", "RES", 404));
        assert_eq!(
            String::from_utf8(record).unwrap(),
            "Request:\nREQ\nResponse:\nRES\n==================================\n\n"
        );
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("failures.log");

        let mut sink = FileSink::create("failure_log", &path).await.unwrap();
        sink.write(&result("A", "B", 500)).await.unwrap();
        sink.write(&result("C", "D", 500)).await.unwrap();
        sink.flush().await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(RECORD_DELIMITER).count(), 2);
        assert!(content.starts_with("Request:\nA\nResponse:\nB\n"));
    }

    #[tokio::test]
    async fn test_file_is_truncated_on_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("success.log");
        std::fs::write(&path, "stale record from a previous run").unwrap();

        let mut sink = FileSink::create("success_log", &path).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/failures.log");
        assert!(FileSink::create("failure_log", &path).await.is_err());
    }
}
