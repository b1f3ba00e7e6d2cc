//! Tests for the pagination driver

use super::*;
use crate::database::RecordStore;
use crate::error::Result;
use crate::observe::RecordingObserver;
use crate::record::{FollowerProfile, Page};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Fakes
// ============================================================================

/// Replays scripted pages and remembers the cursors it was asked for
#[derive(Default)]
struct ScriptedSource {
    pages: Mutex<VecDeque<Result<Page<FollowerProfile>>>>,
    requested: Mutex<Vec<String>>,
    /// Fire this token when the given cursor is fetched
    cancel_on: Option<(String, CancellationToken)>,
}

impl ScriptedSource {
    fn new(pages: Vec<Result<Page<FollowerProfile>>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Default::default()
        }
    }

    fn cancelling_at(mut self, cursor: &str, token: &CancellationToken) -> Self {
        self.cancel_on = Some((cursor.to_string(), token.clone()));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource<FollowerProfile> for ScriptedSource {
    async fn fetch(
        &self,
        cursor: &str,
        cancel: &CancellationToken,
    ) -> Result<Page<FollowerProfile>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.requested.lock().unwrap().push(cursor.to_string());
        if let Some((at, token)) = &self.cancel_on {
            if at == cursor {
                token.cancel();
            }
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("script exhausted".to_string())))
    }
}

/// Keeps every persisted batch
#[derive(Default)]
struct MemorySink {
    batches: Vec<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl RecordSink<FollowerProfile> for MemorySink {
    fn persist(&mut self, records: &[FollowerProfile]) -> Result<usize> {
        if self.fail_on_call == Some(self.batches.len()) {
            return Err(Error::Persistence {
                batch_size: records.len(),
                index: 0,
                id: "d?".to_string(),
                message: "disk full".to_string(),
            });
        }
        self.batches
            .push(records.iter().map(|r| r.did.clone()).collect());
        Ok(records.len())
    }
}

fn follower(did: &str) -> FollowerProfile {
    FollowerProfile {
        did: did.to_string(),
        ..Default::default()
    }
}

fn page(dids: &[&str], cursor: &str) -> Result<Page<FollowerProfile>> {
    Ok(Page::new(
        dids.iter().map(|d| follower(d)).collect(),
        Some(cursor.to_string()),
    ))
}

fn three_pages() -> Vec<Result<Page<FollowerProfile>>> {
    vec![
        page(&["d1", "d2"], "a"),
        page(&["d3"], "b"),
        page(&["d4"], ""),
    ]
}

// ============================================================================
// Type Tests
// ============================================================================

#[test]
fn test_run_status() {
    assert!(!RunStatus::Running.is_terminal());
    assert!(RunStatus::Done.is_terminal());
    assert_eq!(RunStatus::Cancelled.to_string(), "cancelled");
    assert_eq!(
        serde_json::to_string(&RunStatus::Failed).unwrap(),
        "\"failed\""
    );
}

#[test]
fn test_terminal_status_is_sticky() {
    let mut state = PipelineState::new("c");
    state.finish(RunStatus::Done);
    state.finish(RunStatus::Failed);
    assert_eq!(state.status, RunStatus::Done);
}

#[test]
fn test_record_commit() {
    let mut state = PipelineState::new("");
    state.record_commit(30);
    state.record_commit(5);
    assert_eq!(state.records_written, 35);
    assert_eq!(state.pages_committed, 2);
}

#[test]
fn test_pipeline_config() {
    assert_eq!(PipelineConfig::new().max_pages, None);
    assert_eq!(PipelineConfig::new().with_max_pages(3).max_pages, Some(3));
}

// ============================================================================
// Driver Tests
// ============================================================================

#[tokio::test]
async fn test_runs_until_empty_cursor() {
    let source = ScriptedSource::new(three_pages());
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Done);
    assert!(report.error.is_none());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.state.records_written, 4);
    assert_eq!(report.state.pages_committed, 3);
    assert_eq!(report.resume_cursor(), "b");
    assert_eq!(
        pipeline.sink().batches,
        vec![vec!["d1", "d2"], vec!["d3"], vec!["d4"]]
    );
    assert_eq!(pipeline.source.requested(), vec!["", "a", "b"]);
}

#[tokio::test]
async fn test_starts_from_resume_cursor() {
    let source = ScriptedSource::new(vec![page(&["d9"], "")]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("resume-here", &CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(pipeline.source.requested(), vec!["resume-here"]);
}

#[tokio::test]
async fn test_empty_page_with_cursor_keeps_going() {
    let source = ScriptedSource::new(vec![page(&[], "a"), page(&["d1"], "")]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(report.state.pages_committed, 2);
    assert_eq!(report.state.records_written, 1);
}

#[tokio::test]
async fn test_fetch_failure_fails_run() {
    let source = ScriptedSource::new(vec![
        page(&["d1"], "a"),
        Err(Error::ExhaustedRetries {
            cursor: "a".to_string(),
            attempts: 5,
            last: Box::new(Error::UpstreamStatus { status: 503 }),
        }),
    ]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.resume_cursor(), "a");
    assert!(matches!(
        report.error,
        Some(Error::ExhaustedRetries { attempts: 5, .. })
    ));
    assert_eq!(pipeline.sink().batches.len(), 1);
}

#[tokio::test]
async fn test_persist_failure_fails_run() {
    let source = ScriptedSource::new(three_pages());
    let sink = MemorySink {
        fail_on_call: Some(1),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(source, sink);

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert_eq!(report.resume_cursor(), "a");
    assert_eq!(report.state.pages_committed, 1);
    assert!(matches!(report.error, Some(Error::Persistence { .. })));
    assert_eq!(pipeline.source.requested(), vec!["", "a"]);
}

#[tokio::test]
async fn test_bad_record_rolls_back_and_fails() {
    let mut store = RecordStore::open_in_memory("followers").unwrap();
    store.ensure_table::<FollowerProfile>().unwrap();
    let source = ScriptedSource::new(vec![page(&["d1", "", "d3"], "")]);
    let mut pipeline = Pipeline::new(source, store);

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert!(matches!(
        report.error,
        Some(Error::Persistence { index: 1, .. })
    ));
    assert_eq!(pipeline.sink().count().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_writes_on_multi_thread_runtime() {
    let mut store = RecordStore::open_in_memory("followers").unwrap();
    store.ensure_table::<FollowerProfile>().unwrap();
    let source = ScriptedSource::new(three_pages());
    let mut pipeline = Pipeline::new(source, store);

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(pipeline.sink().ids().unwrap(), vec!["d1", "d2", "d3", "d4"]);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut pipeline = Pipeline::new(ScriptedSource::new(three_pages()), MemorySink::default());

    let report = pipeline.run("start", &cancel).await;

    assert_eq!(report.status(), RunStatus::Cancelled);
    assert_eq!(report.exit_code(), 130);
    assert_eq!(report.resume_cursor(), "start");
    assert!(report.error.is_none());
    assert!(pipeline.source.requested().is_empty());
}

#[tokio::test]
async fn test_page_fetched_after_cancel_is_discarded() {
    let cancel = CancellationToken::new();
    let source = ScriptedSource::new(three_pages()).cancelling_at("a", &cancel);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &cancel).await;

    assert_eq!(report.status(), RunStatus::Cancelled);
    assert_eq!(report.resume_cursor(), "a");
    assert_eq!(pipeline.sink().batches, vec![vec!["d1", "d2"]]);
}

#[tokio::test]
async fn test_cancelled_error_from_source() {
    let source = ScriptedSource::new(vec![page(&["d1"], "a"), Err(Error::Cancelled)]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Cancelled);
    assert_eq!(report.resume_cursor(), "a");
    assert!(report.error.is_none());
}

// ============================================================================
// Guard Tests
// ============================================================================

#[tokio::test]
async fn test_repeated_cursor_fails_run() {
    let source = ScriptedSource::new(vec![
        page(&["d1"], "a"),
        page(&["d2"], "b"),
        page(&["d3"], "a"),
    ]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert!(matches!(report.error, Some(Error::CursorLoop { ref cursor }) if cursor == "a"));
    assert_eq!(report.resume_cursor(), "b");
}

#[tokio::test]
async fn test_cursor_equal_to_start_is_a_loop() {
    let source = ScriptedSource::new(vec![page(&["d1"], "start")]);
    let mut pipeline = Pipeline::new(source, MemorySink::default());

    let report = pipeline.run("start", &CancellationToken::new()).await;

    assert!(matches!(report.error, Some(Error::CursorLoop { .. })));
}

#[tokio::test]
async fn test_page_limit() {
    let source = ScriptedSource::new(three_pages());
    let mut pipeline = Pipeline::new(source, MemorySink::default())
        .with_config(PipelineConfig::new().with_max_pages(2));

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert!(matches!(report.error, Some(Error::PageLimit { max_pages: 2 })));
    assert_eq!(report.resume_cursor(), "b");
    assert_eq!(pipeline.sink().batches.len(), 2);
}

#[tokio::test]
async fn test_page_limit_not_hit_when_collection_ends() {
    let source = ScriptedSource::new(three_pages());
    let mut pipeline = Pipeline::new(source, MemorySink::default())
        .with_config(PipelineConfig::new().with_max_pages(3));

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert!(report.is_done());
}

// ============================================================================
// Checkpoint and Observer Tests
// ============================================================================

#[tokio::test]
async fn test_checkpoint_saved_after_each_commit() {
    let state = StateManager::in_memory();
    let source = ScriptedSource::new(vec![page(&["d1"], "a"), Err(Error::Other("boom".into()))]);
    let mut pipeline =
        Pipeline::new(source, MemorySink::default()).with_state(state.clone());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    let checkpoint = state.checkpoint().await.unwrap();
    assert_eq!(checkpoint.cursor, "a");
    assert_eq!(checkpoint.records_written, 1);
    assert_eq!(checkpoint.pages_committed, 1);
}

#[tokio::test]
async fn test_checkpoint_cleared_when_done() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let state = StateManager::new(&path);
    let mut pipeline =
        Pipeline::new(ScriptedSource::new(three_pages()), MemorySink::default())
            .with_state(state.clone());

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert!(report.is_done());
    assert!(state.checkpoint().await.is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_checkpoint_write_failure_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let state = StateManager::new(blocker.join("state.json"));
    let mut pipeline =
        Pipeline::new(ScriptedSource::new(three_pages()), MemorySink::default())
            .with_state(state);

    let report = pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(report.status(), RunStatus::Failed);
    assert!(matches!(report.error, Some(Error::State { .. })));
    assert_eq!(report.resume_cursor(), "");
    assert_eq!(pipeline.sink().batches.len(), 1);
}

#[tokio::test]
async fn test_observer_sees_lifecycle() {
    let observer = Arc::new(RecordingObserver::new());
    let source = ScriptedSource::new(vec![page(&["d1"], "a"), page(&["d2"], "")]);
    let mut pipeline =
        Pipeline::new(source, MemorySink::default()).with_observer(observer.clone());

    pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(
        observer.names(),
        vec!["batch_committed", "cursor_advanced", "batch_committed", "completed"]
    );
}

#[tokio::test]
async fn test_observer_sees_failure() {
    let observer = Arc::new(RecordingObserver::new());
    let source = ScriptedSource::new(vec![Err(Error::Other("boom".into()))]);
    let mut pipeline =
        Pipeline::new(source, MemorySink::default()).with_observer(observer.clone());

    pipeline.run("", &CancellationToken::new()).await;

    assert_eq!(observer.names(), vec!["failed"]);
    assert_eq!(observer.count("completed"), 0);
}
