//! Integration tests for the rebuild daemon driven through the proof API

use super::test_utils::flat_dir;
use provebit::api::ProofApi;
use provebit::daemon::log::LogKind;
use provebit::daemon::DaemonState;
use provebit::error::{ApiError, DaemonError};
use provebit::events::{EventKind, ProofEvent};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(10);

fn count(api: &ProofApi, kind: LogKind) -> usize {
    api.log_entries().iter().filter(|e| e.kind == kind).count()
}

/// Test that nothing is reported before the first build
#[test]
fn test_no_tree_before_first_build() {
    let api = ProofApi::new();
    assert!(api.last_tree().is_none());
    assert_eq!(api.get_daemon_log(), "Daemon Offline");
    assert_eq!(api.status().state, DaemonState::Stopped);
    assert!(api.status().last_root.is_none());
}

/// Test scheduled rebuilds, then stop and restart
#[test]
fn test_scheduled_rebuilds_and_restart() {
    let dir = flat_dir(8);
    let api = ProofApi::new();
    api.add_file_to_tree(dir.path(), false).unwrap();

    let (sender, built) = mpsc::channel();
    let sender = Mutex::new(sender);
    api.subscribe(EventKind::LogUpdated, move |event| {
        if let ProofEvent::LogUpdated { entry } = event {
            if entry.kind == LogKind::Built {
                let _ = sender.lock().unwrap().send(());
            }
        }
    });

    api.start_daemon_with_interval(Duration::from_millis(20)).unwrap();
    built.recv_timeout(WAIT).unwrap();
    built.recv_timeout(WAIT).unwrap();
    api.stop_daemon().unwrap();
    assert!(api.wait_for_idle(WAIT));

    let tree = api.last_tree().unwrap();
    assert_eq!((tree.height(), tree.leaf_count(), tree.tree_size()), (3, 8, 15));
    let log = api.get_daemon_log();
    assert!(log.contains("[started]"));
    assert!(log.contains("[stopped]"));

    // Stopping keeps the tree and the log; restarting appends to the log
    let entries_before = api.log_entries().len();
    api.start_daemon_with_interval(Duration::from_millis(20)).unwrap();
    built.recv_timeout(WAIT).unwrap();
    api.stop_daemon().unwrap();
    assert!(api.wait_for_idle(WAIT));
    assert!(api.log_entries().len() > entries_before);
    assert_eq!(count(&api, LogKind::Started), 2);
}

/// Test control rejections
#[test]
fn test_control_rejections() {
    let api = ProofApi::new();

    assert!(matches!(
        api.start_daemon(0),
        Err(ApiError::Daemon(DaemonError::InvalidPeriod(0)))
    ));
    assert!(matches!(
        api.update_period(5),
        Err(ApiError::Daemon(DaemonError::DaemonNotRunning))
    ));

    api.start_daemon(3600).unwrap();
    assert!(matches!(
        api.start_daemon(3600),
        Err(ApiError::Daemon(DaemonError::AlreadyRunning))
    ));
    assert!(matches!(
        api.update_period(0),
        Err(ApiError::Daemon(DaemonError::InvalidPeriod(0)))
    ));

    api.kill_daemon().unwrap();
    assert!(matches!(
        api.kill_daemon(),
        Err(ApiError::Daemon(DaemonError::Terminated))
    ));
    assert!(matches!(
        api.start_daemon(1),
        Err(ApiError::Daemon(DaemonError::Terminated))
    ));
}

/// Test that registry changes between ticks show up in the next tree
#[test]
fn test_tracking_changes_picked_up_by_next_rebuild() {
    let small = flat_dir(2);
    let large = flat_dir(6);
    let api = ProofApi::new();
    api.add_file_to_tree(small.path(), false).unwrap();

    assert!(api.trigger_rebuild().unwrap());
    assert!(api.wait_for_idle(WAIT));
    assert_eq!(api.last_tree().unwrap().leaf_count(), 2);

    api.remove_file_from_tree(small.path()).unwrap();
    api.add_file_to_tree(large.path(), false).unwrap();
    assert!(api.trigger_rebuild().unwrap());
    assert!(api.wait_for_idle(WAIT));
    assert_eq!(api.last_tree().unwrap().leaf_count(), 6);
}

/// Test that an empty tracked set logs a skip and leaves the previous tree alone
#[test]
fn test_empty_set_keeps_previous_tree() {
    let dir = flat_dir(3);
    let api = ProofApi::new();
    api.add_file_to_tree(dir.path(), false).unwrap();
    api.trigger_rebuild().unwrap();
    assert!(api.wait_for_idle(WAIT));
    let first_root = api.last_tree().unwrap().root_hash();

    api.remove_file_from_tree(dir.path()).unwrap();
    api.trigger_rebuild().unwrap();
    assert!(api.wait_for_idle(WAIT));

    assert_eq!(count(&api, LogKind::EmptyLeafSet), 1);
    assert_eq!(api.last_tree().unwrap().root_hash(), first_root);
}

/// Test that a file removed from disk after tracking is logged, not fatal
#[test]
fn test_vanished_file_logged_as_unreadable() {
    let dir = flat_dir(3);
    let api = ProofApi::new();
    let file = dir.path().join("file02.txt");
    api.add_file_to_tree(dir.path(), false).unwrap();
    api.add_file_to_tree(&file, false).unwrap();
    std::fs::remove_file(&file).unwrap();

    api.trigger_rebuild().unwrap();
    assert!(api.wait_for_idle(WAIT));

    assert_eq!(count(&api, LogKind::FileUnreadable), 1);
    assert_eq!(api.last_tree().unwrap().leaf_count(), 2);
}

/// Test that kill discards the log and the tree
#[test]
fn test_kill_goes_offline() {
    let dir = flat_dir(2);
    let api = ProofApi::new();
    api.add_file_to_tree(dir.path(), false).unwrap();
    api.start_daemon(3600).unwrap();
    api.trigger_rebuild().unwrap();
    assert!(api.wait_for_idle(WAIT));
    assert!(api.last_tree().is_some());

    api.kill_daemon().unwrap();
    assert_eq!(api.get_daemon_log(), "Daemon Offline");
    assert!(api.last_tree().is_none());
    assert_eq!(api.status().state, DaemonState::Terminated);
    assert!(api.is_tracking(dir.path()));
}
