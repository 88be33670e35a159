use std::time::Duration;

use crate::{BatchId, SelectedFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the files as one multipart request and stream its events back.
    SubmitBatch {
        batch_id: BatchId,
        files: Vec<SelectedFile>,
        prompt: Option<String>,
    },
    /// Deliver `Msg::SuccessMessageExpired { token }` after `after`.
    ScheduleSuccessExpiry { token: u64, after: Duration },
}
