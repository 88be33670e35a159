use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use docstream_engine::{
    EngineEvent, EngineHandle, EventSink, FailureKind, ReqwestUploader, StreamEvent, UploadFile,
    UploadSettings, Uploader,
};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = concat!(
    "data: {\"fileName\":\"b.pdf\",\"processedData\":{\"total\":4},\"prompt\":\"totals\"}\n\n",
    "data: {\"fileName\":\"a.pdf\",\"error\":\"scan failed\"}\n\n",
    "data: {\"message\":\"Processing complete\"}\n\n",
);

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn write_pdfs(dir: &TempDir, names: &[&str]) -> Vec<UploadFile> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("%PDF-1.4 {name}")).unwrap();
            UploadFile {
                name: name.to_string(),
                path,
            }
        })
        .collect()
}

fn settings_for(server: &MockServer) -> UploadSettings {
    UploadSettings {
        endpoint: format!("{}/upload", server.uri()),
        ..UploadSettings::default()
    }
}

#[tokio::test]
async fn upload_streams_events_after_acceptance() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("filename=\"a.pdf\""))
        .and(body_string_contains("filename=\"b.pdf\""))
        .and(body_string_contains("name=\"prompt\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_pdfs(&dir, &["a.pdf", "b.pdf"]);
    let uploader = ReqwestUploader::new(settings_for(&server));
    let sink = TestSink::default();

    uploader
        .upload(4, &files, Some("totals"), &sink)
        .await
        .expect("upload ok");

    let events = sink.take();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], EngineEvent::Accepted { batch_id: 4 });
    match &events[1] {
        EngineEvent::Stream {
            batch_id: 4,
            event: StreamEvent::File(file),
        } => {
            assert_eq!(file.file_name, "b.pdf");
            assert_eq!(file.prompt.as_deref(), Some("totals"));
            assert_eq!(file.data, Some(Ok(serde_json::json!({"total": 4}))));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(
        events[3],
        EngineEvent::Stream {
            event: StreamEvent::Completion,
            ..
        }
    ));
}

#[tokio::test]
async fn error_status_uses_json_error_body() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(r#"{"error":"Only PDF files are allowed"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_pdfs(&dir, &["a.pdf"]);
    let uploader = ReqwestUploader::new(settings_for(&server));
    let sink = TestSink::default();

    let err = uploader.upload(1, &files, None, &sink).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "Only PDF files are allowed");
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn error_status_without_json_uses_status_text() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_pdfs(&dir, &["a.pdf"]);
    let uploader = ReqwestUploader::new(settings_for(&server));

    let err = uploader
        .upload(2, &files, None, &TestSink::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Initial request failed: 404 Not Found");
}

#[tokio::test]
async fn no_content_response_is_a_missing_body() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_pdfs(&dir, &["a.pdf"]);
    let uploader = ReqwestUploader::new(settings_for(&server));

    let err = uploader
        .upload(3, &files, None, &TestSink::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::MissingBody);
}

#[tokio::test]
async fn unreadable_file_fails_before_sending() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let missing = UploadFile {
        name: "gone.pdf".into(),
        path: dir.path().join("gone.pdf"),
    };
    let uploader = ReqwestUploader::new(settings_for(&server));

    let err = uploader
        .upload(5, &[missing], None, &TestSink::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::FileRead);
    assert!(err.message.contains("gone.pdf"));
}

#[tokio::test]
async fn invalid_endpoint_is_reported() {
    init_logging();
    let uploader = ReqwestUploader::new(UploadSettings {
        endpoint: "not a url".into(),
        ..UploadSettings::default()
    });

    let err = uploader
        .upload(6, &[], None, &TestSink::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidEndpoint);
}

#[tokio::test]
async fn engine_handle_reports_stream_then_end() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_pdfs(&dir, &["a.pdf", "b.pdf"]);
    let engine = EngineHandle::new(settings_for(&server));
    engine.submit(11, files, None);

    let events = tokio::task::spawn_blocking(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
                let done = matches!(
                    event,
                    EngineEvent::Ended { .. } | EngineEvent::Failed { .. }
                );
                events.push(event);
                if done {
                    break;
                }
            }
        }
        events
    })
    .await
    .unwrap();

    assert_eq!(events.first(), Some(&EngineEvent::Accepted { batch_id: 11 }));
    assert_eq!(events.last(), Some(&EngineEvent::Ended { batch_id: 11 }));
    assert_eq!(events.len(), 5);
}
