use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use docstream_core::{BatchId, Effect, FileResult, Msg};
use docstream_engine::{EngineEvent, EngineHandle, FileEvent, StreamEvent, UploadFile};
use engine_logging::{engine_debug, engine_info, engine_warn};

const ENGINE_POLL: Duration = Duration::from_millis(50);

/// Carries out effects produced by `update` and feeds engine events back as messages.
///
/// The event thread stops when the runner is dropped.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    stop: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let mut runner = Self {
            engine,
            msg_tx,
            stop: Arc::new(AtomicBool::new(false)),
            event_loop: None,
        };
        runner.event_loop = Some(runner.spawn_event_loop());
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitBatch {
                    batch_id,
                    files,
                    prompt,
                } => {
                    engine_info!(
                        "SubmitBatch batch_id={} files={} prompt={}",
                        batch_id,
                        files.len(),
                        prompt.is_some()
                    );
                    let files = files
                        .into_iter()
                        .map(|file| UploadFile {
                            name: file.name,
                            path: file.path,
                        })
                        .collect();
                    self.engine.submit(batch_id.get(), files, prompt);
                }
                Effect::ScheduleSuccessExpiry { token, after } => {
                    let msg_tx = self.msg_tx.clone();
                    thread::spawn(move || {
                        thread::sleep(after);
                        let _ = msg_tx.send(Msg::SuccessMessageExpired { token });
                    });
                }
            }
        }
    }

    fn spawn_event_loop(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let msg_tx = self.msg_tx.clone();
        let stop = self.stop.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let Some(event) = engine.recv_timeout(ENGINE_POLL) else {
                    continue;
                };
                let Some(msg) = event_to_msg(event) else {
                    continue;
                };
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
            engine_debug!("engine event loop stopped");
        })
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.event_loop.take() {
            let _ = handle.join();
        }
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Accepted { batch_id } => Msg::UploadAccepted {
            batch_id: BatchId::new(batch_id),
        },
        EngineEvent::Stream { batch_id, event } => {
            let batch_id = BatchId::new(batch_id);
            match event {
                StreamEvent::Completion => Msg::ProcessingComplete { batch_id },
                StreamEvent::File(file) => Msg::FileResult {
                    batch_id,
                    result: file_result(file),
                },
                StreamEvent::Malformed(err) => Msg::MalformedEvent {
                    batch_id,
                    raw: err.raw,
                    reason: err.reason,
                },
                StreamEvent::Unrecognized => {
                    engine_debug!("batch {batch_id}: unrecognized event ignored");
                    return None;
                }
            }
        }
        EngineEvent::Ended { batch_id } => Msg::StreamEnded {
            batch_id: BatchId::new(batch_id),
        },
        EngineEvent::Failed { batch_id, error } => {
            engine_warn!("batch {batch_id} failed: {} ({})", error, error.kind);
            Msg::UploadFailed {
                batch_id: BatchId::new(batch_id),
                message: error.message,
            }
        }
    };
    Some(msg)
}

/// A backend `error` wins over a local decode failure; the raw text is kept either way.
fn file_result(event: FileEvent) -> FileResult {
    let mut result = FileResult {
        file_name: event.file_name,
        error: event.error,
        prompt: event.prompt,
        ..FileResult::default()
    };
    match event.data {
        Some(Ok(value)) => result.data = Some(value),
        Some(Err(err)) => {
            if result.error.is_none() {
                result.error = Some(err.to_string());
            }
            result.raw_data = Some(err.raw);
        }
        None => {}
    }
    result
}
