//! Tests for StateManager

use super::*;
use crate::error::Error;
use tempfile::tempdir;

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/followers-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(
        manager.path().to_str().unwrap(),
        "/tmp/followers-state.json"
    );
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_from_missing_file() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("state.json")).unwrap();
    assert!(manager.checkpoint().await.is_none());
    assert!(manager.resume_cursor().await.is_none());
}

#[test]
fn test_from_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let result = StateManager::from_file(&path);
    assert!(matches!(result, Err(Error::State { .. })));
}

// ============================================================================
// Save / Load Tests
// ============================================================================

#[tokio::test]
async fn test_save_in_memory() {
    let manager = StateManager::in_memory();
    manager.save(Checkpoint::new("c1", 30, 1)).await.unwrap();
    assert_eq!(manager.resume_cursor().await, Some("c1".to_string()));
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::new(&path);
    manager.save(Checkpoint::new("c1", 30, 1)).await.unwrap();
    manager.save(Checkpoint::new("c2", 60, 2)).await.unwrap();

    let reloaded = StateManager::from_file(&path).unwrap();
    let checkpoint = reloaded.checkpoint().await.unwrap();
    assert_eq!(checkpoint.cursor, "c2");
    assert_eq!(checkpoint.records_written, 60);
    assert_eq!(checkpoint.pages_committed, 2);
}

#[tokio::test]
async fn test_save_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    StateManager::new(&path)
        .save(Checkpoint::new("c1", 1, 1))
        .await
        .unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[tokio::test]
async fn test_save_to_file_with_tmp_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("resume.tmp");

    let manager = StateManager::new(&path);
    assert_eq!(manager.temp_path(), dir.path().join("resume.tmp.tmp"));

    manager.save(Checkpoint::new("c1", 1, 1)).await.unwrap();
    manager.save(Checkpoint::new("c2", 2, 2)).await.unwrap();

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(reloaded.resume_cursor().await, Some("c2".to_string()));
    assert!(!dir.path().join("resume.tmp.tmp").exists());
}

#[tokio::test]
async fn test_save_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    StateManager::new(&path)
        .save(Checkpoint::new("c1", 1, 1))
        .await
        .unwrap();

    assert!(path.exists());
}

#[tokio::test]
async fn test_empty_cursor_is_not_resumable() {
    let manager = StateManager::in_memory();
    manager.save(Checkpoint::new("", 0, 0)).await.unwrap();
    assert!(manager.checkpoint().await.is_some());
    assert!(manager.resume_cursor().await.is_none());
}

#[tokio::test]
async fn test_save_into_unwritable_location_fails() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();

    let manager = StateManager::new(blocker.join("state.json"));
    let result = manager.save(Checkpoint::new("c1", 1, 1)).await;
    assert!(matches!(result, Err(Error::State { .. })));
}

// ============================================================================
// Clear Tests
// ============================================================================

#[tokio::test]
async fn test_clear_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let manager = StateManager::new(&path);

    manager.save(Checkpoint::new("c1", 1, 1)).await.unwrap();
    manager.clear().await.unwrap();

    assert!(!path.exists());
    assert!(manager.checkpoint().await.is_none());
}

#[tokio::test]
async fn test_clear_without_file() {
    let dir = tempdir().unwrap();
    let manager = StateManager::new(dir.path().join("state.json"));
    manager.clear().await.unwrap();
}

#[tokio::test]
async fn test_clones_share_checkpoint() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();
    manager.save(Checkpoint::new("shared", 1, 1)).await.unwrap();
    assert_eq!(clone.resume_cursor().await, Some("shared".to_string()));
}
