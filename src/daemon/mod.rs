//! Rebuild scheduler daemon
//!
//! A ticker thread fires on a fixed interval and hands each rebuild to a
//! short-lived worker thread. Only one rebuild may be in flight; a tick that
//! arrives while one is running is logged as skipped. Control operations are
//! serialized by the control lock and reach the ticker over its command
//! channel, which doubles as the cancellation token.

pub mod log;

use crate::config::{DaemonConfig, TreeConfig};
use crate::error::{DaemonError, TreeError};
use crate::events::{EventBus, ProofEvent};
use crate::registry::TrackedSet;
use crate::tree::builder::{MerkleTree, TreeBuilder};
use crate::tree::collector::collect_leaves;
use crate::tree::walker::FileSystem;
use self::log::{DaemonLog, LogEntry, LogKind};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// Marker returned by log reads when the daemon has never run
pub const OFFLINE_MARKER: &str = "Daemon Offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonState {
    Stopped,
    Running,
    /// Final; a new daemon is required to resume
    Terminated,
}

impl DaemonState {
    pub fn as_str(self) -> &'static str {
        match self {
            DaemonState::Stopped => "stopped",
            DaemonState::Running => "running",
            DaemonState::Terminated => "terminated",
        }
    }
}

/// Point-in-time status summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub state: DaemonState,
    pub period_ms: Option<u64>,
    pub builds: u64,
    pub skipped_ticks: u64,
    pub building: bool,
    pub last_root: Option<String>,
    pub last_leaf_count: Option<usize>,
    pub last_height: Option<u32>,
    pub log_entries: usize,
}

/// Construction options for [`ProofDaemon`]
#[derive(Debug, Clone, Copy)]
pub struct DaemonOptions {
    pub tree_builder: TreeBuilder,
    pub max_log_entries: usize,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self::from_config(&DaemonConfig::default(), &TreeConfig::default())
    }
}

impl DaemonOptions {
    pub fn from_config(daemon: &DaemonConfig, tree: &TreeConfig) -> Self {
        Self {
            tree_builder: TreeBuilder::new()
                .with_odd_node_policy(tree.odd_node_policy)
                .with_empty_tree_policy(tree.empty_tree_policy),
            max_log_entries: daemon.max_log_entries,
        }
    }
}

enum TickerCommand {
    UpdatePeriod(Duration),
    Shutdown,
}

/// Handle to a running ticker; dropping the sender also cancels it
struct Ticker {
    commands: mpsc::Sender<TickerCommand>,
}

impl Ticker {
    fn shutdown(self) {
        // The ticker re-checks its run id before every dispatch, so there is
        // no need to join it (an observer may be stopping us from a worker).
        let _ = self.commands.send(TickerCommand::Shutdown);
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Scheduled { run: u64 },
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Scheduled { .. } => "scheduled",
            Trigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Started,
    Skipped,
    Cancelled,
}

/// State shared between the caller, the ticker and rebuild workers
struct Shared {
    registry: Arc<TrackedSet>,
    fs: Arc<dyn FileSystem>,
    bus: Arc<EventBus>,
    tree_builder: TreeBuilder,
    state: RwLock<DaemonState>,
    run: AtomicU64,
    period: RwLock<Option<Duration>>,
    ever_started: AtomicBool,
    last_tree: RwLock<Option<Arc<MerkleTree>>>,
    log: DaemonLog,
    building: Mutex<bool>,
    idle: Condvar,
    epoch: AtomicU64,
    builds: AtomicU64,
    skipped_ticks: AtomicU64,
}

/// Clears the in-flight flag even if the rebuild panics
struct BuildSlot<'a>(&'a Shared);

impl Drop for BuildSlot<'_> {
    fn drop(&mut self) {
        *self.0.building.lock() = false;
        self.0.idle.notify_all();
    }
}

impl Shared {
    /// Append to the log and announce the entry in sequence order
    fn record(&self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        self.bus.emit_with(|| {
            vec![ProofEvent::LogUpdated {
                entry: self.log.append(kind, message),
            }]
        });
    }

    fn emit_state(&self, state: DaemonState) {
        self.bus.emit(ProofEvent::DaemonStatusChanged { state });
    }

    /// Start a rebuild on a worker thread unless one is already running
    ///
    /// The state lock is held while claiming the build slot, so control
    /// operations are linearized against tick dispatch.
    fn dispatch(self: &Arc<Self>, trigger: Trigger) -> Dispatch {
        let epoch = {
            let state = self.state.read();
            let cancelled = match trigger {
                Trigger::Scheduled { run } => {
                    *state != DaemonState::Running || self.run.load(Ordering::Acquire) != run
                }
                Trigger::Manual => *state == DaemonState::Terminated,
            };
            if cancelled {
                return Dispatch::Cancelled;
            }
            let mut building = self.building.lock();
            if *building {
                None
            } else {
                *building = true;
                Some(self.epoch.load(Ordering::Acquire))
            }
        };

        let Some(epoch) = epoch else {
            self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
            debug!(trigger = trigger.as_str(), "Rebuild already in flight");
            self.record(
                LogKind::Skipped,
                format!(
                    "Skipped {} rebuild: previous rebuild still running",
                    trigger.as_str()
                ),
            );
            return Dispatch::Skipped;
        };

        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("provebit-rebuild".to_string())
            .spawn(move || {
                let _slot = BuildSlot(&shared);
                shared.rebuild(epoch);
            });

        match spawned {
            Ok(_) => Dispatch::Started,
            Err(e) => {
                *self.building.lock() = false;
                self.idle.notify_all();
                error!("Failed to spawn rebuild worker: {}", e);
                self.record(LogKind::Failed, format!("Rebuild could not start: {}", e));
                Dispatch::Skipped
            }
        }
    }

    #[instrument(skip(self))]
    fn rebuild(&self, epoch: u64) {
        let start = Instant::now();
        let snapshot = self.registry.snapshot();
        let collection = collect_leaves(self.fs.as_ref(), &snapshot);
        let skipped = collection.skipped;
        let outcome = self.tree_builder.build(collection.leaves);

        // Appends happen inside the emission so LogUpdated events reach
        // observers in sequence order.
        self.bus.emit_with(|| {
            // Holding the state lock keeps kill from interleaving with the commit.
            let state = self.state.read();
            if *state == DaemonState::Terminated || self.epoch.load(Ordering::Acquire) != epoch {
                info!("Discarding rebuild result after kill");
                return Vec::new();
            }
            let mut pending = Vec::with_capacity(skipped.len() + 1);
            for file in &skipped {
                pending.push(self.log.append(
                    LogKind::FileUnreadable,
                    format!("Skipped {}: {}", file.path.display(), file.reason),
                ));
            }
            let entry = match outcome {
                Ok(tree) => {
                    let message = format!(
                        "Built tree: {} leaves, height {}, size {}, root {}",
                        tree.leaf_count(),
                        tree.height(),
                        tree.tree_size(),
                        tree.root_hex()
                    );
                    info!(
                        leaf_count = tree.leaf_count(),
                        height = tree.height(),
                        root = %tree.root_hex(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Rebuild completed"
                    );
                    *self.last_tree.write() = Some(Arc::new(tree));
                    self.log.append(LogKind::Built, message)
                }
                Err(TreeError::EmptyLeafSet) => {
                    info!(entries = snapshot.len(), "Rebuild produced no leaves");
                    self.log.append(
                        LogKind::EmptyLeafSet,
                        format!(
                            "No leaves collected from {} tracked entries; no tree built",
                            snapshot.len()
                        ),
                    )
                }
            };
            pending.push(entry);
            self.builds.fetch_add(1, Ordering::Relaxed);
            drop(state);
            pending
                .into_iter()
                .map(|entry| ProofEvent::LogUpdated { entry })
                .collect()
        });
    }
}

fn run_ticker(
    shared: Arc<Shared>,
    commands: mpsc::Receiver<TickerCommand>,
    run: u64,
    mut period: Duration,
) {
    let mut next_tick = Instant::now() + period;
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            // Takes effect after the tick that is already scheduled.
            Ok(TickerCommand::UpdatePeriod(new_period)) => period = new_period,
            Ok(TickerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if shared.dispatch(Trigger::Scheduled { run }) == Dispatch::Cancelled {
                    break;
                }
                next_tick += period;
                let now = Instant::now();
                if next_tick <= now {
                    next_tick = now + period;
                }
            }
        }
    }
    debug!(run, "Ticker exited");
}

/// Periodic Merkle rebuild daemon
pub struct ProofDaemon {
    shared: Arc<Shared>,
    control: Mutex<Option<Ticker>>,
}

impl ProofDaemon {
    pub fn new(registry: Arc<TrackedSet>, fs: Arc<dyn FileSystem>, bus: Arc<EventBus>) -> Self {
        Self::with_options(registry, fs, bus, DaemonOptions::default())
    }

    pub fn with_options(
        registry: Arc<TrackedSet>,
        fs: Arc<dyn FileSystem>,
        bus: Arc<EventBus>,
        options: DaemonOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                fs,
                bus,
                tree_builder: options.tree_builder,
                state: RwLock::new(DaemonState::Stopped),
                run: AtomicU64::new(0),
                period: RwLock::new(None),
                ever_started: AtomicBool::new(false),
                last_tree: RwLock::new(None),
                log: DaemonLog::new(options.max_log_entries),
                building: Mutex::new(false),
                idle: Condvar::new(),
                epoch: AtomicU64::new(0),
                builds: AtomicU64::new(0),
                skipped_ticks: AtomicU64::new(0),
            }),
            control: Mutex::new(None),
        }
    }

    /// Start ticking every `period_secs` seconds
    pub fn start(&self, period_secs: u64) -> Result<(), DaemonError> {
        if period_secs == 0 {
            return Err(DaemonError::InvalidPeriod(period_secs));
        }
        self.start_with_interval(Duration::from_secs(period_secs))
    }

    /// Start ticking on an arbitrary positive interval
    pub fn start_with_interval(&self, period: Duration) -> Result<(), DaemonError> {
        let mut control = self.control.lock();
        match self.state() {
            DaemonState::Running => return Err(DaemonError::AlreadyRunning),
            DaemonState::Terminated => return Err(DaemonError::Terminated),
            DaemonState::Stopped => {}
        }
        if period.is_zero() {
            return Err(DaemonError::InvalidPeriod(0));
        }

        let run = {
            let mut state = self.shared.state.write();
            *state = DaemonState::Running;
            self.shared.run.fetch_add(1, Ordering::AcqRel) + 1
        };
        let (commands, receiver) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("provebit-ticker".to_string())
            .spawn(move || run_ticker(shared, receiver, run, period));
        if let Err(e) = spawned {
            *self.shared.state.write() = DaemonState::Stopped;
            return Err(DaemonError::Spawn(e.to_string()));
        }
        *control = Some(Ticker { commands });
        *self.shared.period.write() = Some(period);
        self.shared.ever_started.store(true, Ordering::Release);
        drop(control);

        info!(period_ms = period.as_millis() as u64, "Daemon started");
        self.shared.record(
            LogKind::Started,
            format!("Daemon started with period {}", format_period(period)),
        );
        self.shared.emit_state(DaemonState::Running);
        Ok(())
    }

    /// Halt ticking; the last tree, log and registry are kept
    pub fn stop(&self) -> Result<(), DaemonError> {
        let mut control = self.control.lock();
        match self.state() {
            DaemonState::Running => {}
            DaemonState::Stopped => return Err(DaemonError::DaemonNotRunning),
            DaemonState::Terminated => return Err(DaemonError::Terminated),
        }
        if let Some(ticker) = control.take() {
            ticker.shutdown();
        }
        *self.shared.state.write() = DaemonState::Stopped;
        drop(control);

        info!("Daemon stopped");
        self.shared.record(LogKind::Stopped, "Daemon stopped");
        self.shared.emit_state(DaemonState::Stopped);
        Ok(())
    }

    /// Change the interval of a running daemon from the next scheduled tick on
    pub fn update_period(&self, period_secs: u64) -> Result<(), DaemonError> {
        if period_secs == 0 {
            return Err(DaemonError::InvalidPeriod(period_secs));
        }
        self.update_interval(Duration::from_secs(period_secs))
    }

    pub fn update_interval(&self, period: Duration) -> Result<(), DaemonError> {
        let control = self.control.lock();
        match self.state() {
            DaemonState::Running => {}
            DaemonState::Stopped => return Err(DaemonError::DaemonNotRunning),
            DaemonState::Terminated => return Err(DaemonError::Terminated),
        }
        if period.is_zero() {
            return Err(DaemonError::InvalidPeriod(0));
        }
        if let Some(ticker) = control.as_ref() {
            ticker
                .commands
                .send(TickerCommand::UpdatePeriod(period))
                .map_err(|_| DaemonError::DaemonNotRunning)?;
        }
        *self.shared.period.write() = Some(period);
        drop(control);

        info!(period_ms = period.as_millis() as u64, "Daemon period updated");
        self.shared.record(
            LogKind::PeriodUpdated,
            format!("Period updated to {}", format_period(period)),
        );
        self.shared.emit_state(DaemonState::Running);
        Ok(())
    }

    /// Terminate permanently and discard the log and last tree
    ///
    /// A rebuild already in flight runs to completion and its result is dropped.
    pub fn kill(&self) -> Result<(), DaemonError> {
        let mut control = self.control.lock();
        if self.state() == DaemonState::Terminated {
            return Err(DaemonError::Terminated);
        }
        if let Some(ticker) = control.take() {
            ticker.shutdown();
        }
        {
            let mut state = self.shared.state.write();
            *state = DaemonState::Terminated;
            self.shared.epoch.fetch_add(1, Ordering::AcqRel);
            *self.shared.last_tree.write() = None;
            *self.shared.period.write() = None;
            self.shared.log.clear();
        }
        drop(control);

        info!("Daemon killed");
        self.shared.emit_state(DaemonState::Terminated);
        Ok(())
    }

    /// Request one rebuild now, outside the schedule
    ///
    /// Returns `Ok(false)` when a rebuild is already in flight.
    pub fn trigger(&self) -> Result<bool, DaemonError> {
        match self.shared.dispatch(Trigger::Manual) {
            Dispatch::Started => Ok(true),
            Dispatch::Skipped => Ok(false),
            Dispatch::Cancelled => Err(DaemonError::Terminated),
        }
    }

    /// Accumulated log text, or `None` if the daemon has never started or was killed
    pub fn get_log(&self) -> Option<String> {
        if !self.shared.ever_started.load(Ordering::Acquire)
            || self.state() == DaemonState::Terminated
        {
            return None;
        }
        Some(self.shared.log.render())
    }

    pub fn log_entries(&self) -> Arc<Vec<LogEntry>> {
        self.shared.log.snapshot()
    }

    pub fn state(&self) -> DaemonState {
        *self.shared.state.read()
    }

    /// Most recent successfully built tree
    pub fn last_tree(&self) -> Option<Arc<MerkleTree>> {
        self.shared.last_tree.read().clone()
    }

    pub fn is_building(&self) -> bool {
        *self.shared.building.lock()
    }

    /// Block until no rebuild is in flight; false on timeout
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut building = self.shared.building.lock();
        while *building {
            if self.shared.idle.wait_until(&mut building, deadline).timed_out() {
                return !*building;
            }
        }
        true
    }

    pub fn status(&self) -> DaemonStatus {
        let tree = self.last_tree();
        DaemonStatus {
            state: self.state(),
            period_ms: self.shared.period.read().map(|p| p.as_millis() as u64),
            builds: self.shared.builds.load(Ordering::Relaxed),
            skipped_ticks: self.shared.skipped_ticks.load(Ordering::Relaxed),
            building: self.is_building(),
            last_root: tree.as_ref().map(|t| t.root_hex()),
            last_leaf_count: tree.as_ref().map(|t| t.leaf_count()),
            last_height: tree.as_ref().map(|t| t.height()),
            log_entries: self.shared.log.len(),
        }
    }
}

fn format_period(period: Duration) -> String {
    if period.subsec_nanos() == 0 {
        format!("{}s", period.as_secs())
    } else {
        format!("{}ms", period.as_millis())
    }
}
