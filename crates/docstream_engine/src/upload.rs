use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::io::ReaderStream;

use engine_logging::{engine_debug, engine_info};

use crate::source::{drive_stream, ResponseChunks};
use crate::{BatchId, ChunkDecoder, EngineEvent, FailureKind, UploadError};

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub endpoint: String,
    /// Multipart field name repeated once per file.
    pub file_field: String,
    pub prompt_field: String,
    /// Only connecting is bounded; an open stream may run indefinitely.
    pub connect_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/upload".to_string(),
            file_field: "files".to_string(),
            prompt_field: "prompt".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// A local file to send, with the name the backend will echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub path: PathBuf,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Submits one batch and streams its events into `sink`.
    ///
    /// Returns once the response body has ended. `EngineEvent::Accepted` is
    /// emitted before the first stream event.
    async fn upload(
        &self,
        batch_id: BatchId,
        files: &[UploadFile],
        prompt: Option<&str>,
        sink: &dyn EventSink,
    ) -> Result<(), UploadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    settings: UploadSettings,
}

impl ReqwestUploader {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, UploadError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| UploadError::new(FailureKind::Network, err.to_string()))
    }

    async fn build_form(
        &self,
        files: &[UploadFile],
        prompt: Option<&str>,
    ) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for file in files {
            let read_error = |err: std::io::Error| {
                UploadError::new(
                    FailureKind::FileRead,
                    format!("Could not read {}: {err}", file.path.display()),
                )
            };
            let handle = tokio::fs::File::open(&file.path)
                .await
                .map_err(read_error)?;
            let len = handle.metadata().await.map_err(read_error)?.len();
            let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
            let part = Part::stream_with_length(body, len)
                .file_name(file.name.clone())
                .mime_str(mime_for(&file.name))
                .map_err(map_reqwest_error)?;
            form = form.part(self.settings.file_field.clone(), part);
        }
        if let Some(prompt) = prompt.filter(|text| !text.trim().is_empty()) {
            form = form.text(self.settings.prompt_field.clone(), prompt.to_string());
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload(
        &self,
        batch_id: BatchId,
        files: &[UploadFile],
        prompt: Option<&str>,
        sink: &dyn EventSink,
    ) -> Result<(), UploadError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| UploadError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
        let client = self.build_client()?;
        let form = self.build_form(files, prompt).await?;

        engine_info!(
            "batch {batch_id}: submitting {} file(s) to {endpoint} (prompt: {})",
            files.len(),
            prompt.is_some()
        );
        let response = client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response).await);
        }
        if status == StatusCode::NO_CONTENT {
            return Err(UploadError::new(
                FailureKind::MissingBody,
                "Response body is null, cannot read SSE stream.",
            ));
        }

        let decoder = ChunkDecoder::for_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        sink.emit(EngineEvent::Accepted { batch_id });

        let mut chunks = ResponseChunks::new(response);
        let forwarded = drive_stream(batch_id, &mut chunks, decoder, sink).await?;
        engine_debug!("batch {batch_id}: stream ended after {forwarded} event(s)");
        Ok(())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let is_pdf = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

async fn status_error(response: reqwest::Response) -> UploadError {
    let status = response.status();
    let fallback = format!(
        "Initial request failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string();
    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body).unwrap_or(fallback);
    UploadError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

/// Prefers `message`, then `error`, from a JSON error body.
pub(crate) fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    })
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    UploadError::new(FailureKind::Network, err.to_string())
}
