use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::{FileResult, SelectedFile, ViewMode};

/// Opaque identifier of one roster entry. Allocated in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u64);

impl FileId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// Identifier of one upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

impl BatchId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

pub const DEFAULT_MAX_FILES: usize = 10;

/// Limits applied by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_files: usize,
    /// Roster size above which the oldest settled entries are evicted.
    pub roster_capacity: usize,
    pub success_message_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            roster_capacity: DEFAULT_MAX_FILES * 2,
            success_message_ttl: Duration::from_secs(5),
        }
    }
}

/// One uploaded file and whatever the backend reported for it.
///
/// While `is_loading` is true both `json_data` and `error` are `None`.
/// Once `is_loading` turns false the entry is never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub id: FileId,
    pub batch_id: BatchId,
    pub file_name: String,
    pub prompt_text: Option<String>,
    pub json_data: Option<Value>,
    pub error: Option<String>,
    /// Undecodable `processedData` text kept for diagnostics.
    pub raw_data: Option<String>,
    pub is_loading: bool,
}

impl FileEntry {
    fn pending(id: FileId, batch_id: BatchId, file_name: String, prompt: Option<String>) -> Self {
        Self {
            id,
            batch_id,
            file_name,
            prompt_text: prompt,
            json_data: None,
            error: None,
            raw_data: None,
            is_loading: true,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.is_loading && self.json_data.is_some() && self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettledOutcome {
    Success,
    PartialError,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Request sent, no response yet.
    Submitting,
    /// Response accepted, events are being consumed.
    Streaming,
    Settled(SettledOutcome),
}

impl BatchPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, BatchPhase::Submitting | BatchPhase::Streaming)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Batch {
    pub(crate) members: Vec<FileId>,
    pub(crate) phase: BatchPhase,
    pub(crate) completion_seen: bool,
    pub(crate) auto_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SuccessMessage {
    pub(crate) text: String,
    pub(crate) token: u64,
}

/// Outcome of merging one per-file result into the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergedResult {
    pub(crate) file_id: FileId,
    pub(crate) succeeded: bool,
}

/// The whole UI-facing session: roster, batches, selection and global messages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    config: SessionConfig,
    next_file_id: u64,
    next_batch_id: u64,
    next_message_token: u64,
    roster: BTreeMap<FileId, FileEntry>,
    batches: BTreeMap<BatchId, Batch>,
    selected: Option<FileId>,
    view_mode: ViewMode,
    global_error: Option<String>,
    success: Option<SuccessMessage>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Roster entries in submission order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.roster.values()
    }

    pub fn entry(&self, id: FileId) -> Option<&FileEntry> {
        self.roster.get(&id)
    }

    pub fn batch_entries(&self, batch_id: BatchId) -> impl Iterator<Item = &FileEntry> {
        self.roster
            .values()
            .filter(move |entry| entry.batch_id == batch_id)
    }

    pub fn batch_phase(&self, batch_id: BatchId) -> Option<BatchPhase> {
        self.batches.get(&batch_id).map(|batch| batch.phase)
    }

    pub fn selected_file(&self) -> Option<FileId> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.selected.and_then(|id| self.roster.get(&id))
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn global_error(&self) -> Option<&str> {
        self.global_error.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_ref().map(|msg| msg.text.as_str())
    }

    /// True while any batch is still submitting or streaming.
    pub fn is_uploading(&self) -> bool {
        self.batches.values().any(|batch| batch.phase.is_in_flight())
    }

    pub(crate) fn batches(&self) -> impl Iterator<Item = (&BatchId, &Batch)> {
        self.batches.iter()
    }

    pub(crate) fn batch_mut(&mut self, batch_id: BatchId) -> Option<&mut Batch> {
        self.batches.get_mut(&batch_id)
    }

    pub(crate) fn set_global_error(&mut self, message: impl Into<String>) {
        self.global_error = Some(message.into());
        self.dirty = true;
    }

    pub(crate) fn clear_messages(&mut self) {
        if self.global_error.is_some() || self.success.is_some() {
            self.global_error = None;
            self.success = None;
            self.dirty = true;
        }
    }

    /// Sets the success message and returns the token identifying it.
    pub(crate) fn set_success(&mut self, text: impl Into<String>) -> u64 {
        self.next_message_token += 1;
        let token = self.next_message_token;
        self.success = Some(SuccessMessage {
            text: text.into(),
            token,
        });
        self.dirty = true;
        token
    }

    /// Clears the success message only if it is still the one identified by `token`.
    pub(crate) fn expire_success(&mut self, token: u64) -> bool {
        match &self.success {
            Some(msg) if msg.token == token => {
                self.success = None;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn select(&mut self, id: FileId) -> bool {
        if !self.roster.contains_key(&id) {
            return false;
        }
        self.selected = Some(id);
        self.dirty = true;
        true
    }

    pub(crate) fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.dirty = true;
        }
    }

    /// Appends one pending entry per file and registers the batch as submitting.
    pub(crate) fn seed_batch(&mut self, files: &[SelectedFile], prompt: Option<&str>) -> BatchId {
        self.next_batch_id += 1;
        let batch_id = BatchId(self.next_batch_id);

        let mut members = Vec::with_capacity(files.len());
        for file in files {
            self.next_file_id += 1;
            let id = FileId(self.next_file_id);
            let entry =
                FileEntry::pending(id, batch_id, file.name.clone(), prompt.map(str::to_owned));
            self.roster.insert(id, entry);
            members.push(id);
        }

        self.batches.insert(
            batch_id,
            Batch {
                members,
                phase: BatchPhase::Submitting,
                completion_seen: false,
                auto_selected: false,
            },
        );
        self.dirty = true;
        self.trim_roster();
        batch_id
    }

    pub(crate) fn mark_streaming(&mut self, batch_id: BatchId) -> bool {
        match self.batches.get_mut(&batch_id) {
            Some(batch) if batch.phase == BatchPhase::Submitting => {
                batch.phase = BatchPhase::Streaming;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// First still-pending entry of `batch_id` with the given file name.
    ///
    /// Lookup is scoped to the batch so equal names from other batches never match.
    pub(crate) fn find_pending(&self, batch_id: BatchId, file_name: &str) -> Option<FileId> {
        let batch = self.batches.get(&batch_id)?;
        batch.members.iter().copied().find(|id| {
            self.roster
                .get(id)
                .is_some_and(|entry| entry.is_loading && entry.file_name == file_name)
        })
    }

    pub(crate) fn apply_file_result(
        &mut self,
        batch_id: BatchId,
        result: FileResult,
    ) -> Option<MergedResult> {
        let file_id = self.find_pending(batch_id, &result.file_name)?;
        let entry = self.roster.get_mut(&file_id)?;

        entry.json_data = result.data.filter(|value| !value.is_null());
        entry.error = result.error;
        entry.raw_data = result.raw_data;
        if let Some(prompt) = result.prompt {
            entry.prompt_text = Some(prompt);
        }
        entry.is_loading = false;
        let succeeded = entry.json_data.is_some() && entry.error.is_none();
        self.dirty = true;

        Some(MergedResult { file_id, succeeded })
    }

    /// Marks the first pending entry whose name occurs in `raw` as errored.
    ///
    /// Best effort only: a payload that mentions several names, or a name that
    /// is a substring of another, can be attributed to the wrong entry.
    pub(crate) fn attribute_malformed(
        &mut self,
        batch_id: BatchId,
        raw: &str,
        message: &str,
    ) -> Option<FileId> {
        let batch = self.batches.get(&batch_id)?;
        let file_id = batch.members.iter().copied().find(|id| {
            self.roster.get(id).is_some_and(|entry| {
                entry.is_loading && !entry.file_name.is_empty() && raw.contains(&entry.file_name)
            })
        })?;
        let entry = self.roster.get_mut(&file_id)?;
        entry.error = Some(message.to_string());
        entry.is_loading = false;
        self.dirty = true;
        Some(file_id)
    }

    /// Freezes every pending entry of the batch, optionally with an error.
    /// Returns how many entries were touched.
    pub(crate) fn freeze_pending(&mut self, batch_id: BatchId, error: Option<&str>) -> usize {
        let Some(batch) = self.batches.get(&batch_id) else {
            return 0;
        };
        let mut touched = 0;
        for id in &batch.members {
            if let Some(entry) = self.roster.get_mut(id) {
                if entry.is_loading {
                    entry.is_loading = false;
                    entry.error = error.map(str::to_owned);
                    touched += 1;
                }
            }
        }
        if touched > 0 {
            self.dirty = true;
        }
        touched
    }

    pub(crate) fn settle(&mut self, batch_id: BatchId, outcome: SettledOutcome) {
        if let Some(batch) = self.batches.get_mut(&batch_id) {
            batch.phase = BatchPhase::Settled(outcome);
            self.dirty = true;
        }
        self.trim_roster();
    }

    /// Evicts the oldest entries until the roster fits its capacity.
    ///
    /// Only entries older than every in-flight entry are candidates, so a batch
    /// that settles while an older one is still streaming is kept. The roster may
    /// stay above capacity until the older batches settle too.
    pub(crate) fn trim_roster(&mut self) -> usize {
        let capacity = self.config.roster_capacity;
        if self.roster.len() <= capacity {
            return 0;
        }
        let excess = self.roster.len() - capacity;
        let oldest_in_flight = self
            .batches
            .values()
            .filter(|batch| batch.phase.is_in_flight())
            .filter_map(|batch| batch.members.iter().min().copied())
            .min();
        let evictable: Vec<FileId> = self
            .roster
            .keys()
            .copied()
            .take_while(|id| oldest_in_flight.is_none_or(|boundary| *id < boundary))
            .take(excess)
            .collect();

        for id in &evictable {
            self.roster.remove(id);
            if self.selected == Some(*id) {
                self.selected = None;
            }
        }
        if !evictable.is_empty() {
            let roster = &self.roster;
            self.batches.retain(|_, batch| {
                batch.phase.is_in_flight() || batch.members.iter().any(|id| roster.contains_key(id))
            });
            self.dirty = true;
        }
        evictable.len()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
