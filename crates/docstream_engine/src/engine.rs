use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};

use crate::{
    BatchId, ChannelEventSink, EngineEvent, ReqwestUploader, UploadFile, UploadSettings, Uploader,
};

enum EngineCommand {
    Submit {
        batch_id: BatchId,
        files: Vec<UploadFile>,
        prompt: Option<String>,
    },
}

/// Runs uploads on a background tokio runtime and hands their events back
/// through a channel. Each batch runs as its own task, so streams of
/// different batches may interleave.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: UploadSettings) -> Self {
        Self::with_uploader(Arc::new(ReqwestUploader::new(settings)))
    }

    pub fn with_uploader(uploader: Arc<dyn Uploader>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let uploader = uploader.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(uploader.as_ref(), command, event_tx).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn submit(&self, batch_id: BatchId, files: Vec<UploadFile>, prompt: Option<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            batch_id,
            files,
            prompt,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    uploader: &dyn Uploader,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit {
            batch_id,
            files,
            prompt,
        } => {
            let sink = ChannelEventSink::new(event_tx.clone());
            let result = uploader
                .upload(batch_id, &files, prompt.as_deref(), &sink)
                .await;
            let event = match result {
                Ok(()) => {
                    engine_info!("batch {batch_id}: stream ended");
                    EngineEvent::Ended { batch_id }
                }
                Err(error) => {
                    engine_warn!("batch {batch_id}: upload failed ({}): {}", error.kind, error);
                    EngineEvent::Failed { batch_id, error }
                }
            };
            let _ = event_tx.send(event);
        }
    }
}
