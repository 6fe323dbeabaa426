//! Integration tests for the tracked-set boundary

use super::test_utils::flat_dir;
use provebit::api::ProofApi;
use provebit::error::{ApiError, RegistryError};
use provebit::events::{EventKind, ProofEvent};
use provebit::tree::path::normalize_tracked_path;
use std::sync::{Arc, Mutex};
use std::thread;

/// Test the is_tracking lifecycle
#[test]
fn test_is_tracking_lifecycle() {
    let dir = flat_dir(1);
    let api = ProofApi::new();

    assert!(!api.is_tracking(dir.path()));
    api.add_file_to_tree(dir.path(), true).unwrap();
    assert!(api.is_tracking(dir.path()));
    api.remove_file_from_tree(dir.path()).unwrap();
    assert!(!api.is_tracking(dir.path()));
}

/// Test that a trailing separator names the same root
#[test]
fn test_trailing_separator_same_root() {
    let dir = flat_dir(1);
    let api = ProofApi::new();
    let with_slash = format!("{}/", dir.path().display());

    api.add_file_to_tree(dir.path(), false).unwrap();
    assert!(api.is_tracking(std::path::Path::new(&with_slash)));
    assert!(matches!(
        api.add_file_to_tree(std::path::Path::new(&with_slash), false),
        Err(ApiError::Registry(RegistryError::AlreadyTracked(_)))
    ));
}

/// Test that concurrent adds of one path register it exactly once
#[test]
fn test_concurrent_duplicate_adds() {
    let dir = flat_dir(1);
    let api = Arc::new(ProofApi::new());
    let path = dir.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let api = Arc::clone(&api);
            let path = path.clone();
            thread::spawn(move || api.add_file_to_tree(&path, true).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(api.tracked().len(), 1);
}

/// Test that tracking events carry the normalized path
#[test]
fn test_tracking_events() {
    let dir = flat_dir(1);
    let api = ProofApi::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    api.subscribe(EventKind::TrackingSetChanged, move |event| {
        if let ProofEvent::TrackingSetChanged { path, tracked } = event {
            sink.lock().unwrap().push((path.clone(), *tracked));
        }
    });

    api.add_file_to_tree(dir.path(), false).unwrap();
    api.remove_file_from_tree(dir.path()).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, seen[1].0);
    assert_eq!((seen[0].1, seen[1].1), (true, false));
    assert_eq!(seen[0].0, normalize_tracked_path(dir.path()));
}
