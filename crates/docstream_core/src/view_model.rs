use crate::{derive_table, AppState, BatchId, BatchPhase, FileEntry, FileId, TableView};

/// How the selected document is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Json,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Processing,
    Failed(String),
    Succeeded,
    /// Settled without data or error.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub file_id: FileId,
    pub batch_id: BatchId,
    pub file_name: String,
    pub prompt: Option<String>,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentView {
    Json(String),
    Table(TableView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFileView {
    pub file_id: FileId,
    pub file_name: String,
    /// `None` while processing or when the file produced no data.
    pub document: Option<DocumentView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchView {
    pub batch_id: BatchId,
    pub phase: BatchPhase,
    pub completion_seen: bool,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub files: Vec<FileRowView>,
    pub batches: Vec<BatchView>,
    pub selected: Option<SelectedFileView>,
    pub view_mode: ViewMode,
    pub is_uploading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            files: self.entries().map(row_view).collect(),
            batches: self
                .batches()
                .map(|(batch_id, batch)| BatchView {
                    batch_id: *batch_id,
                    phase: batch.phase,
                    completion_seen: batch.completion_seen,
                    file_count: batch.members.len(),
                })
                .collect(),
            selected: self
                .selected_entry()
                .map(|entry| selected_view(entry, self.view_mode())),
            view_mode: self.view_mode(),
            is_uploading: self.is_uploading(),
            error: self.global_error().map(str::to_owned),
            success: self.success_message().map(str::to_owned),
        }
    }
}

fn row_view(entry: &FileEntry) -> FileRowView {
    FileRowView {
        file_id: entry.id,
        batch_id: entry.batch_id,
        file_name: entry.file_name.clone(),
        prompt: entry.prompt_text.clone(),
        status: status_of(entry),
    }
}

fn status_of(entry: &FileEntry) -> FileStatus {
    if entry.is_loading {
        FileStatus::Processing
    } else if let Some(error) = &entry.error {
        FileStatus::Failed(error.clone())
    } else if entry.json_data.is_some() {
        FileStatus::Succeeded
    } else {
        FileStatus::NoData
    }
}

fn selected_view(entry: &FileEntry, mode: ViewMode) -> SelectedFileView {
    let document = entry.json_data.as_ref().map(|data| match mode {
        ViewMode::Json => DocumentView::Json(
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        ),
        ViewMode::Table => DocumentView::Table(derive_table(data)),
    });
    SelectedFileView {
        file_id: entry.id,
        file_name: entry.file_name.clone(),
        document,
    }
}
