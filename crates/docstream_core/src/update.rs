use crate::state::SettledOutcome;
use crate::{AppState, BatchId, BatchPhase, Effect, FileResult, Msg, SelectedFile};

pub const ALL_PROCESSED_MESSAGE: &str = "All files processed successfully.";
pub const STREAM_ENDED_MESSAGE: &str = "File stream ended.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSelected { files, prompt } => start_batch(&mut state, files, prompt),
        Msg::UploadAccepted { batch_id } => {
            state.mark_streaming(batch_id);
            Vec::new()
        }
        Msg::FileResult { batch_id, result } => apply_file_result(&mut state, batch_id, result),
        Msg::ProcessingComplete { batch_id } => complete_batch(&mut state, batch_id),
        Msg::MalformedEvent {
            batch_id,
            raw,
            reason,
        } => {
            if is_in_flight(&state, batch_id) {
                let message = format!("Failed to parse event data: {reason}");
                state.attribute_malformed(batch_id, &raw, &message);
            }
            Vec::new()
        }
        Msg::StreamEnded { batch_id } => end_stream(&mut state, batch_id),
        Msg::UploadFailed { batch_id, message } => {
            fail_batch(&mut state, batch_id, &message);
            Vec::new()
        }
        Msg::FileSelected { file_id } => {
            if state.select(file_id) {
                state.clear_messages();
            }
            Vec::new()
        }
        Msg::ViewModeChanged(mode) => {
            state.set_view_mode(mode);
            Vec::new()
        }
        Msg::SuccessMessageExpired { token } => {
            state.expire_success(token);
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn start_batch(
    state: &mut AppState,
    files: Vec<SelectedFile>,
    prompt: Option<String>,
) -> Vec<Effect> {
    if files.is_empty() {
        return Vec::new();
    }

    let max_files = state.config().max_files;
    if files.len() > max_files {
        state.clear_messages();
        state.set_global_error(format!(
            "You can upload a maximum of {max_files} files at a time."
        ));
        return Vec::new();
    }

    let prompt = prompt.filter(|text| !text.trim().is_empty());
    state.clear_messages();
    let batch_id = state.seed_batch(&files, prompt.as_deref());

    vec![Effect::SubmitBatch {
        batch_id,
        files,
        prompt,
    }]
}

fn apply_file_result(state: &mut AppState, batch_id: BatchId, result: FileResult) -> Vec<Effect> {
    if !is_in_flight(state, batch_id) {
        return Vec::new();
    }
    let Some(merged) = state.apply_file_result(batch_id, result) else {
        return Vec::new();
    };

    if merged.succeeded && state.selected_file().is_none() {
        let already_fired = state
            .batch_mut(batch_id)
            .map(|batch| std::mem::replace(&mut batch.auto_selected, true))
            .unwrap_or(true);
        if !already_fired {
            state.select(merged.file_id);
        }
    }
    Vec::new()
}

fn complete_batch(state: &mut AppState, batch_id: BatchId) -> Vec<Effect> {
    if !is_in_flight(state, batch_id) {
        return Vec::new();
    }
    state.freeze_pending(batch_id, None);
    if let Some(batch) = state.batch_mut(batch_id) {
        batch.completion_seen = true;
    }
    let token = state.set_success(ALL_PROCESSED_MESSAGE);
    settle_streamed(state, batch_id);

    vec![Effect::ScheduleSuccessExpiry {
        token,
        after: state.config().success_message_ttl,
    }]
}

fn end_stream(state: &mut AppState, batch_id: BatchId) -> Vec<Effect> {
    if !is_in_flight(state, batch_id) {
        return Vec::new();
    }
    state.freeze_pending(batch_id, None);
    let token = state.set_success(STREAM_ENDED_MESSAGE);
    settle_streamed(state, batch_id);

    vec![Effect::ScheduleSuccessExpiry {
        token,
        after: state.config().success_message_ttl,
    }]
}

fn fail_batch(state: &mut AppState, batch_id: BatchId, message: &str) {
    if !is_in_flight(state, batch_id) {
        return;
    }
    let message = if message.trim().is_empty() {
        "An error occurred during file processing."
    } else {
        message
    };
    state.set_global_error(message);
    state.freeze_pending(batch_id, Some(message));
    state.settle(batch_id, SettledOutcome::Failure);
}

fn settle_streamed(state: &mut AppState, batch_id: BatchId) {
    let outcome = if state.global_error().is_some() {
        SettledOutcome::PartialError
    } else {
        SettledOutcome::Success
    };
    state.settle(batch_id, outcome);
}

fn is_in_flight(state: &AppState, batch_id: BatchId) -> bool {
    state
        .batch_phase(batch_id)
        .is_some_and(BatchPhase::is_in_flight)
}
