//! Tests for StateManager

use super::*;
use crate::controller::RunOptions;
use crate::profile::load_profile;
use chrono::NaiveDate;
use tempfile::tempdir;

fn session(files: usize) -> Session {
    let profile = load_profile("daily").unwrap();
    let options = RunOptions::new().with_cutoff(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    let queue = (0..files)
        .map(|i| FileRef::new(format!("/data/f{i}.csv")))
        .collect();
    Session::new(profile, options, queue)
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-session.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-session.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_no_session_yields_reset_state() {
    let manager = StateManager::in_memory();
    assert!(manager.session().await.is_none());
    assert!(manager.require_session().await.is_err());

    let state = manager.state().await;
    assert_eq!(state.index, 0);
    assert!(state.queue.is_empty());
}

// ============================================================================
// Session Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_start_and_update() {
    let manager = StateManager::in_memory();
    manager.start(session(2)).await.unwrap();

    let mut state = manager.state().await;
    state.index = 1;
    state.running = true;
    manager.update_state(state).await.unwrap();

    let current = manager.require_session().await.unwrap();
    assert_eq!(current.state.index, 1);
    assert!(current.state.running);
    assert_eq!(current.profile.name, "daily");
}

#[tokio::test]
async fn test_update_without_session_fails() {
    let manager = StateManager::in_memory();
    assert!(manager
        .update_state(ProcessingState::reset())
        .await
        .is_err());
}

#[tokio::test]
async fn test_reset_keeps_profile() {
    let manager = StateManager::in_memory();
    manager.start(session(3)).await.unwrap();

    let mut state = manager.state().await;
    state.index = 2;
    state.running = true;
    manager.update_state(state).await.unwrap();

    let fresh = manager.reset().await.unwrap();
    assert_eq!(fresh.view().index, 0);

    let current = manager.require_session().await.unwrap();
    assert!(current.state.queue.is_empty());
    assert!(!current.state.running);
    assert!(current.state.log.is_empty());
    assert_eq!(current.profile.name, "daily");
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let manager = StateManager::new(&path);
    manager.start(session(2)).await.unwrap();
    assert!(path.exists());
    // No temp file left behind
    assert!(!path.with_extension("tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    let restored = reloaded.require_session().await.unwrap();
    assert_eq!(restored.state.queue.len(), 2);
    assert_eq!(
        restored.options.cutoff,
        NaiveDate::from_ymd_opt(2024, 2, 9)
    );
}

#[tokio::test]
async fn test_load_picks_up_external_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let writer = StateManager::new(&path);
    let reader = StateManager::new(&path);
    writer.start(session(1)).await.unwrap();

    assert!(reader.session().await.is_none());
    reader.load().await.unwrap();
    assert!(reader.session().await.is_some());
}

#[tokio::test]
async fn test_from_missing_file() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("none.json")).unwrap();
    assert!(manager.session().await.is_none());
}

#[tokio::test]
async fn test_reset_without_session_persists_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let manager = StateManager::new(&path);
    manager.reset().await.unwrap();

    // A saved "no session" file reloads cleanly
    let reloaded = StateManager::from_file(&path).unwrap();
    assert!(reloaded.session().await.is_none());
}

#[test]
fn test_corrupt_file_is_state_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = StateManager::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse state file"));
}

#[tokio::test]
async fn test_clone_shares_session() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();
    manager.start(session(1)).await.unwrap();
    assert!(clone.session().await.is_some());
}
