//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置解析 + 任务加载 + 分发的完整链路
//! - 针对本地 HTTP 服务的 e2e 测试
//! - 传输错误触发的整轮取消

#[cfg(test)]
mod support {
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::any;
    use axum::{Json, Router};
    use serde_json::Value;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    /// One request as seen by the test server
    #[derive(Debug, Clone)]
    pub struct Seen {
        pub id: u64,
        pub method: String,
        pub authorization: Option<String>,
        pub env: Option<String>,
    }

    #[derive(Clone)]
    struct ServerState {
        fail_ids: Arc<HashSet<u64>>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    /// Local HTTP endpoint answering 404 for selected `id`s and 200 otherwise
    pub struct TestServer {
        pub url: String,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl TestServer {
        pub async fn start(fail_ids: &[u64]) -> Self {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let state = ServerState {
                fail_ids: Arc::new(fail_ids.iter().copied().collect()),
                seen: Arc::clone(&seen),
            };
            let app = Router::new().route("/ingest", any(ingest)).with_state(state);

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr: SocketAddr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });

            Self {
                url: format!("http://{addr}/ingest"),
                seen,
            }
        }

        pub fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    async fn ingest(
        State(state): State<ServerState>,
        method: axum::http::Method,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        let id = body.get("id").and_then(Value::as_u64).unwrap_or_default();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        state.seen.lock().unwrap().push(Seen {
            id,
            method: method.to_string(),
            authorization: header("authorization"),
            env: header("x-env"),
        });

        if state.fail_ids.contains(&id) {
            (StatusCode::NOT_FOUND, format!("no record {id}"))
        } else {
            (StatusCode::OK, format!("accepted {id}"))
        }
    }

    /// Raw endpoint that resets the connection for `id == 0` and never
    /// answers anything else
    pub async fn start_resetting_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_raw(stream));
            }
        });
        format!("http://{addr}/ingest")
    }

    async fn handle_raw(mut stream: TcpStream) {
        let Ok(body) = read_body(&mut stream).await else {
            return;
        };
        let id = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_u64));
        if id == Some(0) {
            // dropping the socket closes it before any response
            return;
        }
        std::future::pending::<()>().await;
        drop(stream);
    }

    async fn read_body(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(Vec::new());
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let start = end + 4;
            if buf.len() >= start + length {
                return Ok(buf[start..start + length].to_vec());
            }
        }
    }

    /// Write `[{"id": 0}, {"id": 1}, ...]` to a data file
    pub fn write_jobs(dir: &std::path::Path, count: u64) -> std::path::PathBuf {
        let payloads: Vec<Value> = (0..count)
            .map(|id| serde_json::json!({ "id": id, "name": format!("item-{id}") }))
            .collect();
        let path = dir.join("reqs.json");
        std::fs::write(&path, serde_json::to_vec(&payloads).unwrap()).unwrap();
        path
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{load_jobs, resolve, ConfigFormat, ConfigLoader, RawConfig};
    use contracts::{DispatchConfig, TokenAuth};
    use dispatcher::{DispatcherBuilder, ProgressRecorder, FAILURE_SINK, RECORD_DELIMITER, SUCCESS_SINK};

    use crate::support::{start_resetting_server, write_jobs, TestServer};

    fn delimiter_count(text: &str) -> usize {
        text.lines().filter(|line| *line == RECORD_DELIMITER).count()
    }

    /// 10 jobs over 3 workers, every response 200
    #[tokio::test]
    async fn test_all_success_writes_no_failure_records() {
        let server = TestServer::start(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 10);
        let failure_log = dir.path().join("failed.log");

        let mut config = DispatchConfig::new(&server.url, 3);
        config.failure_log = Some(failure_log.clone());
        let recorder = ProgressRecorder::new();

        let report = DispatcherBuilder::new(config)
            .progress(recorder.clone())
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();

        assert_eq!(report.total_jobs, 10);
        assert_eq!(report.processed, 10);
        assert_eq!(report.failed, 0);
        assert!(!report.cancelled);
        assert_eq!(recorder.advances(), 10);
        assert!(recorder.events().iter().all(|&failed| failed == 0));
        assert!(recorder.is_finished());

        let mut ids: Vec<u64> = server.seen().iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());

        // created fresh even though nothing failed
        assert_eq!(std::fs::read_to_string(&failure_log).unwrap(), "");
    }

    /// One 404 among five jobs lands in the failure log, verbatim
    #[tokio::test]
    async fn test_rejected_request_is_recorded() {
        let server = TestServer::start(&[3]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 5);
        let failure_log = dir.path().join("failed.log");

        let mut config = DispatchConfig::new(&server.url, 2);
        config.failure_log = Some(failure_log.clone());
        let recorder = ProgressRecorder::new();

        let report = DispatcherBuilder::new(config)
            .progress(recorder.clone())
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 4);
        assert!(!report.cancelled);
        assert_eq!(recorder.events().last(), Some(&1));

        let text = std::fs::read_to_string(&failure_log).unwrap();
        assert_eq!(delimiter_count(&text), 1);
        assert!(text.starts_with("Request:\nPOST "));
        assert!(text.contains(&format!("POST {} HTTP/1.1\r\n", server.url)));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains(r#"{"id":3,"name":"item-3"}"#));
        assert!(text.contains("\nResponse:\nHTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("no record 3"));
        assert!(!text.contains("item-1"));

        let failure_sink = report.sinks.iter().find(|(name, _)| name == FAILURE_SINK);
        assert_eq!(failure_sink.map(|(_, m)| m.records_written), Some(1));
    }

    /// Successes are only persisted when a success log is configured
    #[tokio::test]
    async fn test_success_log_is_optional() {
        let server = TestServer::start(&[0]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 4);
        let success_log = dir.path().join("ok.log");

        let mut config = DispatchConfig::new(&server.url, 4);
        config.success_log = Some(success_log.clone());
        let report = DispatcherBuilder::new(config)
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.sinks.len(), 1);
        assert_eq!(report.sinks[0].0, SUCCESS_SINK);
        let text = std::fs::read_to_string(&success_log).unwrap();
        assert_eq!(delimiter_count(&text), 3);
        assert!(!text.contains("no record 0"));

        // no destinations at all: results are only counted
        let report = DispatcherBuilder::new(DispatchConfig::new(&server.url, 2))
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();
        assert_eq!(report.processed, 4);
        assert!(report.sinks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_requests() {
        let server = TestServer::start(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = dir.path().join("empty.json");
        std::fs::write(&data_file, "[]").unwrap();
        let recorder = ProgressRecorder::new();

        let report = DispatcherBuilder::new(DispatchConfig::new(&server.url, 5))
            .progress(recorder.clone())
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();

        assert_eq!(report.processed, 0);
        assert!(!report.cancelled);
        assert!(server.seen().is_empty());
        assert!(recorder.is_finished());
    }

    /// Nothing listens on the port: the first transport error cancels the run
    #[tokio::test]
    async fn test_connection_refused_cancels_run() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 20);
        let failure_log = dir.path().join("failed.log");

        let mut config = DispatchConfig::new(format!("http://{addr}/ingest"), 3);
        config.failure_log = Some(failure_log.clone());

        let report = DispatcherBuilder::new(config)
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert!(report.transport_errors >= 1);
        assert_eq!(
            report.transport_errors + report.abandoned,
            report.total_jobs as u64
        );
        assert_eq!(std::fs::read_to_string(&failure_log).unwrap(), "");
    }

    /// A reset connection aborts the requests still hanging on the server
    #[tokio::test]
    async fn test_reset_aborts_in_flight_requests() {
        let url = start_resetting_server().await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 12);

        let dispatcher = DispatcherBuilder::new(DispatchConfig::new(url, 3))
            .build()
            .await
            .unwrap();
        let jobs = load_jobs(&data_file).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(5), dispatcher.dispatch(jobs))
            .await
            .expect("hanging requests were not aborted")
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert_eq!(report.transport_errors, 1);
        assert_eq!(report.abandoned, 11);
    }

    /// Config file -> resolve -> dispatch, with auth and an extra header
    #[tokio::test]
    async fn test_config_file_drives_dispatch() {
        let server = TestServer::start(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 3);

        let file_layer = ConfigLoader::load_from_str(
            &format!(
                "worker_count = 2\nurl = {}\ndata_file = {}\nmethod = put\n\
                 token_scheme = Bearer\ntoken_value = s3cret\nheader = X-Env: staging\n",
                server.url,
                data_file.display()
            ),
            ConfigFormat::KeyValue,
        )
        .unwrap();
        let cli_layer = RawConfig {
            worker_count: Some(3),
            ..Default::default()
        };

        let resolved = resolve(cli_layer.merge(file_layer)).unwrap();
        assert_eq!(resolved.dispatch.worker_count, 3);
        assert_eq!(resolved.dispatch.auth, Some(TokenAuth::new("Bearer", "s3cret")));

        let report = DispatcherBuilder::new(resolved.dispatch)
            .build()
            .await
            .unwrap()
            .dispatch(load_jobs(&resolved.data_file).unwrap())
            .await
            .unwrap();
        assert_eq!(report.processed, 3);

        let seen = server.seen();
        assert_eq!(seen.len(), 3);
        for request in seen {
            assert_eq!(request.method, "PUT");
            assert_eq!(request.authorization.as_deref(), Some("Bearer s3cret"));
            assert_eq!(request.env.as_deref(), Some("staging"));
        }
    }

    #[tokio::test]
    async fn test_external_cancellation_stops_dispatch() {
        let server = TestServer::start(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let data_file = write_jobs(dir.path(), 8);

        let dispatcher = DispatcherBuilder::new(DispatchConfig::new(&server.url, 2))
            .build()
            .await
            .unwrap();
        dispatcher.cancellation().trip();

        let report = dispatcher
            .dispatch(load_jobs(&data_file).unwrap())
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert!(server.seen().is_empty());
    }
}
