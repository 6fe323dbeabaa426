//! Proof API
//!
//! Command boundary for an external collaborator (CLI, UI shell). Wires the
//! tracked-set registry, the filesystem capability, the rebuild daemon and the
//! event bus together; callers never touch those pieces directly.

use crate::config::ProvebitConfig;
use crate::daemon::log::LogEntry;
use crate::daemon::{DaemonOptions, DaemonStatus, ProofDaemon, OFFLINE_MARKER};
use crate::error::ApiError;
use crate::events::{EventBus, EventKind, ProofEvent, SubscriptionId};
use crate::registry::{TrackedEntry, TrackedSet};
use crate::tree::builder::{MerkleTree, TreeBuilder};
use crate::tree::collector::collect_leaves;
use crate::tree::walker::{FileSystem, LocalFileSystem, PathKind, WalkerConfig};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Proof-of-existence service
pub struct ProofApi {
    registry: Arc<TrackedSet>,
    fs: Arc<dyn FileSystem>,
    bus: Arc<EventBus>,
    daemon: ProofDaemon,
    tree_builder: TreeBuilder,
    default_period_secs: u64,
}

impl ProofApi {
    /// Service over the local disk with default configuration
    pub fn new() -> Self {
        Self::from_config(&ProvebitConfig::default())
    }

    pub fn from_config(config: &ProvebitConfig) -> Self {
        let fs = LocalFileSystem::with_config(WalkerConfig {
            follow_symlinks: config.tree.follow_symlinks,
        });
        Self::with_filesystem(Arc::new(fs), config)
    }

    /// Service over an arbitrary filesystem capability
    pub fn with_filesystem(fs: Arc<dyn FileSystem>, config: &ProvebitConfig) -> Self {
        let registry = Arc::new(TrackedSet::new());
        let bus = Arc::new(EventBus::new());
        let options = DaemonOptions::from_config(&config.daemon, &config.tree);
        let daemon = ProofDaemon::with_options(
            Arc::clone(&registry),
            Arc::clone(&fs),
            Arc::clone(&bus),
            options,
        );
        Self {
            registry,
            fs,
            bus,
            daemon,
            tree_builder: options.tree_builder,
            default_period_secs: config.daemon.default_period_secs,
        }
    }

    pub fn default_period_secs(&self) -> u64 {
        self.default_period_secs
    }

    pub fn start_daemon(&self, period_secs: u64) -> Result<(), ApiError> {
        Ok(self.daemon.start(period_secs)?)
    }

    /// Start on a sub-second interval
    pub fn start_daemon_with_interval(&self, period: Duration) -> Result<(), ApiError> {
        Ok(self.daemon.start_with_interval(period)?)
    }

    pub fn stop_daemon(&self) -> Result<(), ApiError> {
        Ok(self.daemon.stop()?)
    }

    pub fn update_period(&self, period_secs: u64) -> Result<(), ApiError> {
        Ok(self.daemon.update_period(period_secs)?)
    }

    pub fn kill_daemon(&self) -> Result<(), ApiError> {
        Ok(self.daemon.kill()?)
    }

    /// Activity log text, or `"Daemon Offline"` when the daemon never ran or was killed
    pub fn get_daemon_log(&self) -> String {
        self.daemon
            .get_log()
            .unwrap_or_else(|| OFFLINE_MARKER.to_string())
    }

    pub fn log_entries(&self) -> Arc<Vec<LogEntry>> {
        self.daemon.log_entries()
    }

    /// Register a file or directory
    ///
    /// `recursive` only applies to directories; plain files are stored with
    /// `recursive = false`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn add_file_to_tree(&self, path: &Path, recursive: bool) -> Result<(), ApiError> {
        let kind = match self.fs.kind(path) {
            Ok(kind) => kind,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ApiError::PathNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(ApiError::Io(e)),
        };
        let is_directory = kind == PathKind::Directory;
        let entry = TrackedEntry {
            path: path.to_path_buf(),
            is_directory,
            recursive: recursive && is_directory,
        };
        let tracked_path = self.registry.add(entry)?;

        info!(path = %tracked_path.display(), is_directory, "Tracking path");
        self.bus.emit(ProofEvent::TrackingSetChanged {
            path: tracked_path,
            tracked: true,
        });
        Ok(())
    }

    pub fn remove_file_from_tree(&self, path: &Path) -> Result<(), ApiError> {
        let removed = self.registry.remove(path)?;
        info!(path = %removed.path.display(), "Stopped tracking path");
        self.bus.emit(ProofEvent::TrackingSetChanged {
            path: removed.path,
            tracked: false,
        });
        Ok(())
    }

    pub fn is_tracking(&self, path: &Path) -> bool {
        self.registry.is_tracking(path)
    }

    /// Tracked roots ordered by path
    pub fn tracked(&self) -> Vec<TrackedEntry> {
        self.registry.snapshot()
    }

    /// Request an immediate rebuild; `Ok(false)` if one is already in flight
    pub fn trigger_rebuild(&self) -> Result<bool, ApiError> {
        Ok(self.daemon.trigger()?)
    }

    pub fn status(&self) -> DaemonStatus {
        self.daemon.status()
    }

    pub fn last_tree(&self) -> Option<Arc<MerkleTree>> {
        self.daemon.last_tree()
    }

    /// Block until no rebuild is in flight; false on timeout
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        self.daemon.wait_for_idle(timeout)
    }

    pub fn subscribe<F>(&self, kind: EventKind, observer: F) -> SubscriptionId
    where
        F: Fn(&ProofEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Build a tree from the current tracked set on the calling thread
    ///
    /// Bypasses the daemon entirely: nothing is logged to the activity log
    /// and `last_tree` is left alone.
    pub fn build_once(&self) -> Result<MerkleTree, ApiError> {
        let snapshot = self.registry.snapshot();
        let collection = collect_leaves(self.fs.as_ref(), &snapshot);
        debug!(
            leaves = collection.leaves.len(),
            skipped = collection.skipped.len(),
            "One-shot build"
        );
        Ok(self.tree_builder.build(collection.leaves)?)
    }
}

impl Default for ProofApi {
    fn default() -> Self {
        Self::new()
    }
}
