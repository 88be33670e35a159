use std::path::PathBuf;

use serde_json::Value;

use crate::{BatchId, FileId, ViewMode};

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Client-side name; the backend echoes it back as the correlation key.
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A per-file result reported by the backend, already decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileResult {
    pub file_name: String,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub prompt: Option<String>,
    pub raw_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked files to upload, with an optional custom prompt.
    FilesSelected {
        files: Vec<SelectedFile>,
        prompt: Option<String>,
    },
    /// Backend answered the submission with a success status and a body.
    UploadAccepted { batch_id: BatchId },
    /// Backend reported the result for one file.
    FileResult { batch_id: BatchId, result: FileResult },
    /// Backend declared the batch finished.
    ProcessingComplete { batch_id: BatchId },
    /// An event payload could not be decoded as JSON.
    MalformedEvent {
        batch_id: BatchId,
        raw: String,
        reason: String,
    },
    /// The response body ended normally.
    StreamEnded { batch_id: BatchId },
    /// Submission or streaming failed at the transport level.
    UploadFailed { batch_id: BatchId, message: String },
    /// User selected a roster entry for display.
    FileSelected { file_id: FileId },
    /// User switched the display mode.
    ViewModeChanged(ViewMode),
    /// The success message timer identified by `token` fired.
    SuccessMessageExpired { token: u64 },
    /// Idle tick from the message loop; changes nothing.
    Tick,
}
