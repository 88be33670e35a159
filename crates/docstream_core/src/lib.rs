//! Docstream core: pure upload session state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod table;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{FileResult, Msg, SelectedFile};
pub use state::{
    AppState, BatchId, BatchPhase, FileEntry, FileId, SessionConfig, SettledOutcome,
    DEFAULT_MAX_FILES,
};
pub use table::{derive_table, TableView};
pub use update::{update, ALL_PROCESSED_MESSAGE, STREAM_ENDED_MESSAGE};
pub use view_model::{
    AppViewModel, BatchView, DocumentView, FileRowView, FileStatus, SelectedFileView, ViewMode,
};
