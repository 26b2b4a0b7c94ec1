use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tubepull_engine::{
    ClientSettings, DownloadRequest, FailureKind, JobBackend, JobEnd, JobKind, RecordSink,
    ReqwestBackend, StreamRecord,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    records: Arc<Mutex<Vec<StreamRecord>>>,
}

impl TestSink {
    fn take(&self) -> Vec<StreamRecord> {
        self.records.lock().unwrap().drain(..).collect()
    }
}

impl RecordSink for TestSink {
    fn emit(&self, record: StreamRecord) {
        self.records.lock().unwrap().push(record);
    }
}

fn backend_for(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("backend")
}

fn request() -> DownloadRequest {
    DownloadRequest {
        url: "https://www.youtube.com/watch?v=abc".to_string(),
        quality: "720p".to_string(),
        format: "mp4".to_string(),
    }
}

fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

#[tokio::test]
async fn single_job_posts_request_and_streams_records_in_order() {
    pull_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "url": "https://www.youtube.com/watch?v=abc",
            "quality": "720p",
            "format": "mp4",
        })))
        .respond_with(event_stream(concat!(
            "data: {\"progress\":10}\n\n",
            "data: {\"progress\":55,\"message\":\"Downloading\"}\n\n",
            "data: {\"status\":\"complete\",\"downloadUrl\":\"/downloads/abc.mp4\",\"filename\":\"abc.mp4\"}\n\n",
            "data: {\"progress\":100}\n\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let sink = TestSink::default();
    let end = backend
        .run_job(JobKind::Single, &request(), &sink)
        .await
        .expect("job ok");

    assert_eq!(end, JobEnd::Terminal);
    let records = sink.take();
    assert_eq!(records.len(), 3, "records after the terminal one are not forwarded");
    assert_eq!(records[0].progress, Some(10.0));
    assert_eq!(records[1].message.as_deref(), Some("Downloading"));
    assert!(records[2].is_complete());
    assert_eq!(records[2].download_url.as_deref(), Some("/downloads/abc.mp4"));
}

#[tokio::test]
async fn collection_job_uses_playlist_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download-playlist"))
        .respond_with(event_stream(
            "data: {\"status\":\"error\",\"message\":\"playlist is private\"}\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let sink = TestSink::default();
    let end = backend
        .run_job(JobKind::Collection, &request(), &sink)
        .await
        .expect("job ok");

    assert_eq!(end, JobEnd::Terminal);
    let records = sink.take();
    assert!(records[0].is_error());
    assert_eq!(records[0].message.as_deref(), Some("playlist is private"));
}

#[tokio::test]
async fn non_success_initiation_is_http_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let sink = TestSink::default();
    let err = backend
        .run_job(JobKind::Single, &request(), &sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert!(err.to_string().contains("503"));
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn stream_without_terminal_record_reports_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(event_stream("data: {\"progress\":40}\ndata: garbage\n"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let sink = TestSink::default();
    let end = backend
        .run_job(JobKind::Single, &request(), &sink)
        .await
        .expect("job ok");

    assert_eq!(end, JobEnd::StreamClosed);
    assert_eq!(sink.take().len(), 1);
}

#[tokio::test]
async fn unreachable_backend_is_network_failure() {
    let backend = ReqwestBackend::new(ClientSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        connect_timeout: Duration::from_millis(200),
        ..ClientSettings::default()
    })
    .expect("backend");
    let sink = TestSink::default();
    let err = backend
        .run_job(JobKind::Single, &request(), &sink)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}

#[tokio::test]
async fn info_lookup_decodes_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/info"))
        .and(body_json(serde_json::json!({ "url": "https://youtu.be/abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "A talk",
            "author": "Someone",
            "duration": 754,
            "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let info = backend
        .fetch_info("https://youtu.be/abc")
        .await
        .expect("info");
    assert_eq!(info.title, "A talk");
    assert_eq!(info.author, "Someone");
    assert_eq!(info.duration_seconds(), 754);
    assert_eq!(info.thumbnail.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));
}

#[tokio::test]
async fn info_lookup_failures_resolve_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let backend = backend_for(&server);
    assert_eq!(backend.fetch_info("https://youtu.be/abc").await, None);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let backend = backend_for(&server);
    assert_eq!(backend.fetch_info("https://youtu.be/abc").await, None);
}

#[tokio::test]
async fn slow_info_lookup_times_out_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(serde_json::json!({ "title": "late" })),
        )
        .mount(&server)
        .await;

    let backend = ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        info_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("backend");
    assert_eq!(backend.fetch_info("https://youtu.be/abc").await, None);
}
