use proptest::prelude::*;
use std::cell::Cell;
use std::collections::VecDeque;
use todo_core::db::DbError;
use todo_core::{
    ControllerPhase, RecognitionConfig, RepoError, RepoResult, SpeechError, SpeechRecognizer,
    StorageOperation, SubmitOutcome, TodoController, TodoId, TodoItem, TodoRepository, TodoStore,
    Transcript, VoiceOutcome,
};

/// Wraps an in-memory store, counting writes and failing on demand.
struct ProbeRepo {
    inner: TodoStore,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
    fail_reads: Cell<bool>,
}

impl ProbeRepo {
    fn new() -> Self {
        Self {
            inner: TodoStore::in_memory(),
            writes: Cell::new(0),
            fail_writes: Cell::new(false),
            fail_reads: Cell::new(false),
        }
    }

    fn check(&self, fail: &Cell<bool>) -> RepoResult<()> {
        if fail.get() {
            return Err(RepoError::StorageUnavailable(DbError::Sqlite(
                rusqlite::Error::InvalidQuery,
            )));
        }
        Ok(())
    }

    fn write(&self) -> RepoResult<()> {
        self.check(&self.fail_writes)?;
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl TodoRepository for ProbeRepo {
    fn create_todo(&self, text: &str) -> RepoResult<()> {
        self.write()?;
        self.inner.create_todo(text)
    }

    fn list_todos(&self) -> RepoResult<Vec<TodoItem>> {
        self.check(&self.fail_reads)?;
        self.inner.list_todos()
    }

    fn update_todo(&self, id: TodoId, text: &str) -> RepoResult<()> {
        self.write()?;
        self.inner.update_todo(id, text)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        self.write()?;
        self.inner.delete_todo(id)
    }
}

struct ScriptedRecognizer {
    results: VecDeque<Result<Option<Transcript>, SpeechError>>,
}

impl ScriptedRecognizer {
    fn boxed(results: Vec<Result<Option<Transcript>, SpeechError>>) -> Box<dyn SpeechRecognizer> {
        Box::new(Self {
            results: results.into(),
        })
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn listen_once(
        &mut self,
        config: &RecognitionConfig,
    ) -> Result<Option<Transcript>, SpeechError> {
        assert!(!config.continuous);
        assert!(config.interim_results);
        self.results.pop_front().unwrap_or(Ok(None))
    }
}

fn transcript(text: &str) -> Transcript {
    Transcript {
        text: text.to_string(),
    }
}

#[test]
fn submit_on_empty_store_creates_first_item() {
    let mut controller = TodoController::new(TodoStore::in_memory());
    controller.load().unwrap();

    controller.set_draft("Buy milk");
    let outcome = controller.submit().unwrap();

    assert_eq!(outcome, SubmitOutcome::Created);
    assert_eq!(
        controller.repository().list_todos().unwrap(),
        vec![TodoItem::new(1, "Buy milk")]
    );
    assert_eq!(controller.items(), &[TodoItem::new(1, "Buy milk")]);
    assert!(controller.draft_text().is_empty());
}

#[test]
fn edit_then_submit_updates_in_place() {
    let store = TodoStore::in_memory();
    store.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    let item = controller.items()[0].clone();
    controller.begin_edit(&item);
    assert_eq!(controller.draft_text(), "Buy milk");
    assert_eq!(controller.submit_label(), "Update TODO");

    controller.set_draft("Buy bread");
    let outcome = controller.submit().unwrap();

    assert_eq!(outcome, SubmitOutcome::Updated(1));
    assert_eq!(
        controller.repository().list_todos().unwrap(),
        vec![TodoItem::new(1, "Buy bread")]
    );
    assert!(controller.editing().is_none());
    assert_eq!(controller.submit_label(), "Add TODO");
}

#[test]
fn update_leaves_other_items_untouched() {
    let store = TodoStore::in_memory();
    store.create_todo("Buy milk").unwrap();
    store.create_todo("Walk dog").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    let first = controller.items()[0].clone();
    controller.begin_edit(&first);
    controller.set_draft("Buy oat milk");
    controller.submit().unwrap();

    assert_eq!(
        controller.items(),
        &[TodoItem::new(1, "Buy oat milk"), TodoItem::new(2, "Walk dog")]
    );
}

#[test]
fn delete_removes_item_and_reloads() {
    let store = TodoStore::in_memory();
    store.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    controller.delete(1).unwrap();

    assert!(controller.repository().list_todos().unwrap().is_empty());
    assert!(controller.items().is_empty());
}

#[test]
fn deleting_absent_id_changes_nothing() {
    let store = TodoStore::in_memory();
    store.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    controller.delete(77).unwrap();

    assert_eq!(controller.items(), &[TodoItem::new(1, "Buy milk")]);
}

#[test]
fn deleting_item_under_edit_leaves_edit_mode() {
    let store = TodoStore::in_memory();
    store.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    let item = controller.items()[0].clone();
    controller.begin_edit(&item);
    controller.delete(item.id).unwrap();

    assert!(controller.editing().is_none());
    assert!(controller.draft_text().is_empty());
}

#[test]
fn whitespace_draft_never_reaches_storage() {
    let mut controller = TodoController::new(ProbeRepo::new());
    controller.load().unwrap();

    for draft in ["", "   ", "\t\n "] {
        controller.set_draft(draft);
        assert_eq!(controller.submit().unwrap(), SubmitOutcome::Ignored);
    }

    let item = TodoItem::new(1, "existing");
    controller.begin_edit(&item);
    controller.set_draft("  ");
    assert_eq!(controller.submit().unwrap(), SubmitOutcome::Ignored);

    assert_eq!(controller.repository().writes.get(), 0);
    assert!(controller.repository().list_todos().unwrap().is_empty());
}

#[test]
fn switching_edit_target_discards_draft_without_writing() {
    let store = ProbeRepo::new();
    store.inner.create_todo("A").unwrap();
    store.inner.create_todo("B").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    let a = controller.items()[0].clone();
    let b = controller.items()[1].clone();
    controller.begin_edit(&a);
    controller.set_draft("A edited but unsaved");
    controller.begin_edit(&b);

    assert_eq!(controller.editing(), Some(&b));
    assert_eq!(controller.draft_text(), "B");
    assert_eq!(controller.repository().writes.get(), 0);
    assert_eq!(
        controller.repository().list_todos().unwrap(),
        vec![TodoItem::new(1, "A"), TodoItem::new(2, "B")]
    );
}

#[test]
fn failed_load_keeps_previous_list_and_records_notice() {
    let store = ProbeRepo::new();
    store.inner.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();

    controller.repository().fail_reads.set(true);
    let err = controller.load().unwrap_err();

    assert!(matches!(err, RepoError::StorageUnavailable(_)));
    assert_eq!(controller.items(), &[TodoItem::new(1, "Buy milk")]);
    let notice = controller.last_error().expect("notice should be recorded");
    assert_eq!(notice.operation, StorageOperation::Load);

    controller.repository().fail_reads.set(false);
    controller.load().unwrap();
    assert!(controller.last_error().is_none());
}

#[test]
fn failed_write_keeps_draft_for_retry() {
    let mut controller = TodoController::new(ProbeRepo::new());
    controller.load().unwrap();
    controller.repository().fail_writes.set(true);

    controller.set_draft("Buy milk");
    assert!(controller.submit().is_err());

    assert_eq!(controller.draft_text(), "Buy milk");
    assert_eq!(
        controller.last_error().map(|notice| notice.operation),
        Some(StorageOperation::Submit)
    );

    controller.repository().fail_writes.set(false);
    assert_eq!(controller.submit().unwrap(), SubmitOutcome::Created);
    assert!(controller.last_error().is_none());
    assert_eq!(controller.items(), &[TodoItem::new(1, "Buy milk")]);
}

#[test]
fn failed_delete_is_surfaced() {
    let store = ProbeRepo::new();
    store.inner.create_todo("Buy milk").unwrap();
    let mut controller = TodoController::new(store);
    controller.load().unwrap();
    controller.repository().fail_writes.set(true);

    assert!(controller.delete(1).is_err());

    assert_eq!(
        controller.last_error().map(|notice| notice.operation),
        Some(StorageOperation::Delete)
    );
    assert_eq!(controller.items(), &[TodoItem::new(1, "Buy milk")]);
}

#[test]
fn stale_load_result_is_discarded() {
    let mut controller = TodoController::new(TodoStore::in_memory());

    let older = controller.begin_load();
    let newer = controller.begin_load();
    assert_eq!(controller.phase(), ControllerPhase::Loading);

    let applied = controller
        .finish_load(newer, Ok(vec![TodoItem::new(1, "Buy milk"), TodoItem::new(2, "Bread")]))
        .unwrap();
    assert!(applied);

    let applied = controller
        .finish_load(older, Ok(vec![TodoItem::new(1, "Buy milk")]))
        .unwrap();
    assert!(!applied);

    assert_eq!(controller.items().len(), 2);
    assert_eq!(controller.phase(), ControllerPhase::Idle);
}

#[test]
fn stale_load_failure_does_not_record_notice() {
    let mut controller = TodoController::new(TodoStore::in_memory());

    let older = controller.begin_load();
    let newer = controller.begin_load();
    controller.finish_load(newer, Ok(Vec::new())).unwrap();

    let stale_err = RepoError::InvalidData("late".to_string());
    assert!(!controller.finish_load(older, Err(stale_err)).unwrap());
    assert!(controller.last_error().is_none());
}

#[test]
fn voice_capture_without_capability_is_a_noop() {
    let mut controller = TodoController::new(TodoStore::in_memory());
    controller.set_draft("typed");

    assert!(!controller.has_voice_input());
    assert_eq!(controller.voice_capture(), VoiceOutcome::Unavailable);
    assert_eq!(controller.draft_text(), "typed");
}

#[test]
fn voice_capture_writes_transcript_into_draft() {
    let recognizer = ScriptedRecognizer::boxed(vec![Ok(Some(transcript("牛乳を買う")))]);
    let mut controller = TodoController::new(TodoStore::in_memory())
        .with_speech(Some(recognizer), RecognitionConfig::default());

    assert!(controller.has_voice_input());
    assert_eq!(controller.voice_capture(), VoiceOutcome::Captured);
    assert_eq!(controller.draft_text(), "牛乳を買う");
    assert!(controller.repository().list_todos().unwrap().is_empty());

    controller.submit().unwrap();
    assert_eq!(controller.items(), &[TodoItem::new(1, "牛乳を買う")]);
}

#[test]
fn voice_capture_without_speech_or_with_failure_keeps_draft() {
    let recognizer = ScriptedRecognizer::boxed(vec![Ok(None), Err(SpeechError::Exited(Some(2)))]);
    let mut controller = TodoController::new(TodoStore::in_memory())
        .with_speech(Some(recognizer), RecognitionConfig::default());
    controller.set_draft("typed");

    assert_eq!(controller.voice_capture(), VoiceOutcome::NoSpeech);
    assert!(matches!(controller.voice_capture(), VoiceOutcome::Failed(_)));
    assert_eq!(controller.draft_text(), "typed");
    assert!(controller.last_error().is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn whitespace_drafts_never_write(
        drafts in prop::collection::vec("[ \t\r\n\u{00A0}\u{3000}]{0,8}", 1..8),
        editing in any::<bool>(),
    ) {
        let store = ProbeRepo::new();
        store.inner.create_todo("existing").unwrap();
        let mut controller = TodoController::new(store);
        controller.load().unwrap();
        if editing {
            let item = controller.items()[0].clone();
            controller.begin_edit(&item);
        }

        for draft in drafts {
            controller.set_draft(draft);
            prop_assert_eq!(controller.submit().unwrap(), SubmitOutcome::Ignored);
        }

        prop_assert_eq!(controller.repository().writes.get(), 0);
        prop_assert_eq!(
            controller.repository().list_todos().unwrap(),
            vec![TodoItem::new(1, "existing")]
        );
    }
}
