use std::fmt;

use crate::StreamEvent;

pub type BatchId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The backend accepted the upload and the event stream is open.
    Accepted { batch_id: BatchId },
    /// One interpreted event from the stream.
    Stream { batch_id: BatchId, event: StreamEvent },
    /// The stream ended normally.
    Ended { batch_id: BatchId },
    /// Submission or streaming failed; no further events follow for the batch.
    Failed { batch_id: BatchId, error: UploadError },
}

impl EngineEvent {
    pub fn batch_id(&self) -> BatchId {
        match self {
            EngineEvent::Accepted { batch_id }
            | EngineEvent::Stream { batch_id, .. }
            | EngineEvent::Ended { batch_id }
            | EngineEvent::Failed { batch_id, .. } => *batch_id,
        }
    }
}

/// Transport-level failure. `message` is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UploadError {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    FileRead,
    HttpStatus(u16),
    MissingBody,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::FileRead => write!(f, "file read error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MissingBody => write!(f, "missing response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
