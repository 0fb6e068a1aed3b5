//! TODO view controller.
//!
//! # Responsibility
//! - Hold the transient list, draft and edit state a view renders from.
//! - Route every mutation through the repository, then re-read the list.
//! - Feed optional speech input into the draft.
//!
//! # Invariants
//! - Blank drafts never reach the repository.
//! - At most one item is being edited.
//! - Only the newest load result is applied; stale reads are discarded.
//! - Storage failures are recorded for display, never swallowed.

use crate::model::todo::{is_submittable, TodoId, TodoItem};
use crate::repo::todo_repo::{RepoError, RepoResult, TodoRepository};
use crate::speech::{RecognitionConfig, SpeechRecognizer};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};

/// Submit button label while adding.
pub const ADD_LABEL: &str = "Add TODO";
/// Submit button label while editing.
pub const UPDATE_LABEL: &str = "Update TODO";

/// Coarse controller phase exposed to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    /// A list read is outstanding; views may disable their triggers.
    Loading,
}

/// Sequence number handed out by [`TodoController::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// What a submit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Draft was blank; nothing was written.
    Ignored,
    Created,
    Updated(TodoId),
}

/// Result of a voice capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// No recognizer on this platform; the control is a no-op.
    Unavailable,
    /// Listening ended without recognized speech.
    NoSpeech,
    /// The transcript replaced the draft.
    Captured,
    /// The recognizer failed; the draft is unchanged.
    Failed(String),
}

/// Storage operation a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    Load,
    Submit,
    Delete,
}

impl StorageOperation {
    fn describe(self) -> &'static str {
        match self {
            Self::Load => "load the list",
            Self::Submit => "save the item",
            Self::Delete => "delete the item",
        }
    }

    fn event(self) -> &'static str {
        match self {
            Self::Load => "controller_load",
            Self::Submit => "controller_submit",
            Self::Delete => "controller_delete",
        }
    }
}

/// User-visible record of the last storage failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotice {
    pub operation: StorageOperation,
    pub message: String,
}

impl Display for StorageNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not {}: {}", self.operation.describe(), self.message)
    }
}

/// State machine behind the single TODO view.
pub struct TodoController<R: TodoRepository> {
    repo: R,
    items: Vec<TodoItem>,
    draft_text: String,
    editing: Option<TodoItem>,
    speech: Option<Box<dyn SpeechRecognizer>>,
    recognition: RecognitionConfig,
    last_error: Option<StorageNotice>,
    next_ticket: u64,
    applied_ticket: u64,
    outstanding_loads: usize,
}

impl<R: TodoRepository> TodoController<R> {
    /// Creates a controller with an empty list and no speech input.
    ///
    /// Nothing is read until [`Self::load`] runs.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            items: Vec::new(),
            draft_text: String::new(),
            editing: None,
            speech: None,
            recognition: RecognitionConfig::default(),
            last_error: None,
            next_ticket: 1,
            applied_ticket: 0,
            outstanding_loads: 0,
        }
    }

    /// Attaches the optional speech capability.
    pub fn with_speech(
        mut self,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        config: RecognitionConfig,
    ) -> Self {
        self.speech = recognizer;
        self.recognition = config;
        self
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn editing(&self) -> Option<&TodoItem> {
        self.editing.as_ref()
    }

    pub fn last_error(&self) -> Option<&StorageNotice> {
        self.last_error.as_ref()
    }

    pub fn has_voice_input(&self) -> bool {
        self.speech.is_some()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn phase(&self) -> ControllerPhase {
        if self.outstanding_loads > 0 {
            ControllerPhase::Loading
        } else {
            ControllerPhase::Idle
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            UPDATE_LABEL
        } else {
            ADD_LABEL
        }
    }

    /// Replaces the draft, as typing into the text field does.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    /// Re-reads the full list from storage.
    ///
    /// On failure the previous list stays visible, the notice is recorded
    /// and the error is returned. There is no automatic retry.
    pub fn load(&mut self) -> RepoResult<()> {
        let ticket = self.begin_load();
        let result = self.repo.list_todos();
        self.finish_load(ticket, result).map(|_| ())
    }

    /// Starts a list read and returns its sequence number.
    pub fn begin_load(&mut self) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding_loads += 1;
        ticket
    }

    /// Completes a read started by [`Self::begin_load`].
    ///
    /// Returns `Ok(false)` when a newer read has already been applied and
    /// this result was discarded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: RepoResult<Vec<TodoItem>>,
    ) -> RepoResult<bool> {
        self.outstanding_loads = self.outstanding_loads.saturating_sub(1);
        if ticket.0 <= self.applied_ticket {
            debug!(
                "event=controller_load module=controller status=stale ticket={} applied={}",
                ticket.0, self.applied_ticket
            );
            return Ok(false);
        }
        self.applied_ticket = ticket.0;

        match result {
            Ok(items) => {
                debug!(
                    "event=controller_load module=controller status=ok count={}",
                    items.len()
                );
                self.items = items;
                self.last_error = None;
                Ok(true)
            }
            Err(err) => {
                self.record_failure(StorageOperation::Load, &err);
                Err(err)
            }
        }
    }

    /// Creates or updates from the draft, then reloads.
    ///
    /// Blank drafts are ignored. When the write fails the draft and edit
    /// state are kept so the user can try again.
    pub fn submit(&mut self) -> RepoResult<SubmitOutcome> {
        if !is_submittable(&self.draft_text) {
            debug!("event=controller_submit module=controller status=ignored reason=blank_draft");
            return Ok(SubmitOutcome::Ignored);
        }

        let written = match &self.editing {
            Some(item) => self
                .repo
                .update_todo(item.id, &self.draft_text)
                .map(|()| SubmitOutcome::Updated(item.id)),
            None => self
                .repo
                .create_todo(&self.draft_text)
                .map(|()| SubmitOutcome::Created),
        };
        let outcome = match written {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(StorageOperation::Submit, &err);
                return Err(err);
            }
        };

        info!("event=controller_submit module=controller status=ok outcome={outcome:?}");
        self.draft_text.clear();
        self.editing = None;
        self.load()?;
        Ok(outcome)
    }

    /// Puts `item` into the draft for editing.
    ///
    /// An unsaved edit of another item is discarded; storage is untouched.
    pub fn begin_edit(&mut self, item: &TodoItem) {
        if let Some(previous) = &self.editing {
            if previous.id != item.id {
                debug!(
                    "event=controller_edit module=controller status=switched from={} to={}",
                    previous.id, item.id
                );
            }
        }
        self.editing = Some(item.clone());
        self.draft_text = item.text.clone();
    }

    /// Leaves edit mode and clears the draft.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft_text.clear();
    }

    /// Deletes `id` without confirmation, then reloads.
    pub fn delete(&mut self, id: TodoId) -> RepoResult<()> {
        if let Err(err) = self.repo.delete_todo(id) {
            self.record_failure(StorageOperation::Delete, &err);
            return Err(err);
        }

        info!("event=controller_delete module=controller status=ok id={id}");
        if self.editing.as_ref().is_some_and(|item| item.id == id) {
            self.cancel_edit();
        }
        self.load()
    }

    /// Listens once and writes the transcript into the draft.
    pub fn voice_capture(&mut self) -> VoiceOutcome {
        let Some(recognizer) = self.speech.as_mut() else {
            return VoiceOutcome::Unavailable;
        };

        match recognizer.listen_once(&self.recognition) {
            Ok(Some(transcript)) => {
                info!("event=controller_voice module=controller status=ok");
                self.draft_text = transcript.text;
                VoiceOutcome::Captured
            }
            Ok(None) => {
                debug!("event=controller_voice module=controller status=no_speech");
                VoiceOutcome::NoSpeech
            }
            Err(err) => {
                warn!("event=controller_voice module=controller status=error error={err}");
                VoiceOutcome::Failed(err.to_string())
            }
        }
    }

    fn record_failure(&mut self, operation: StorageOperation, err: &RepoError) {
        error!(
            "event={} module=controller status=error error={err}",
            operation.event()
        );
        self.last_error = Some(StorageNotice {
            operation,
            message: err.to_string(),
        });
    }
}
