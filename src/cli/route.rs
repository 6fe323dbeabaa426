//! CLI route: single route table and run context. Dispatches to the proof API and presentation.

use crate::api::ProofApi;
use crate::config::{ConfigLoader, ProvebitConfig};
use crate::error::ApiError;
use crate::events::{EventKind, ProofEvent};
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cli::output::map_error;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_status_text, format_tracked_text, format_tree_json, format_tree_text,
};
use crate::cli::shell::{parse_shell_line, ShellCommand, SHELL_HELP};

/// Upper bound on waiting for an in-flight rebuild when a command winds down
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime context for CLI execution: workspace, effective config, and the proof API.
pub struct RunContext {
    api: ProofApi,
    config: ProvebitConfig,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: ProvebitConfig) -> Self {
        Self {
            api: ProofApi::from_config(&config),
            config,
            workspace_root,
        }
    }

    pub fn api(&self) -> &ProofApi {
        &self.api
    }

    pub fn config(&self) -> &ProvebitConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        debug!(command = command.name(), "Executing command");
        match command {
            Commands::Prove {
                paths,
                recursive,
                format,
            } => self.handle_prove(paths, *recursive, *format),
            Commands::Run {
                paths,
                recursive,
                period,
                interval_ms,
                ticks,
            } => self.handle_run(paths, *recursive, *period, *interval_ms, *ticks),
            Commands::Shell => {
                let stdin = std::io::stdin();
                self.run_shell(stdin.lock(), Arc::new(Mutex::new(std::io::stdout())))?;
                Ok(String::new())
            }
            Commands::Config => self.config.to_toml(),
        }
    }

    fn track_all(&self, paths: &[PathBuf], recursive: bool) -> Result<(), ApiError> {
        for path in paths {
            self.api.add_file_to_tree(path, recursive)?;
        }
        Ok(())
    }

    fn handle_prove(
        &self,
        paths: &[PathBuf],
        recursive: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        self.track_all(paths, recursive)?;
        let tree = self.api.build_once()?;
        Ok(match format {
            OutputFormat::Text => format_tree_text(&tree),
            OutputFormat::Json => format_tree_json(&tree, &self.api.tracked()),
        })
    }

    fn handle_run(
        &self,
        paths: &[PathBuf],
        recursive: bool,
        period: Option<u64>,
        interval_ms: Option<u64>,
        ticks: u64,
    ) -> Result<String, ApiError> {
        self.track_all(paths, recursive)?;

        let (sender, completed) = mpsc::channel();
        let sender = Mutex::new(sender);
        let subscription = self.api.subscribe(EventKind::LogUpdated, move |event| {
            if let ProofEvent::LogUpdated { entry } = event {
                if entry.kind.is_build_outcome() {
                    let _ = sender.lock().send(());
                }
            }
        });

        let started = match interval_ms {
            Some(ms) => self
                .api
                .start_daemon_with_interval(Duration::from_millis(ms)),
            None => self
                .api
                .start_daemon(period.unwrap_or(self.api.default_period_secs())),
        };
        if let Err(e) = started {
            self.api.unsubscribe(subscription);
            return Err(e);
        }

        for tick in 0..ticks {
            if completed.recv().is_err() {
                break;
            }
            info!(tick = tick + 1, ticks, "Rebuild completed");
        }

        self.api.stop_daemon()?;
        self.api.wait_for_idle(IDLE_TIMEOUT);
        self.api.unsubscribe(subscription);

        let mut output = self.api.get_daemon_log();
        if let Some(tree) = self.api.last_tree() {
            output.push_str("\n\n");
            output.push_str(&format_tree_text(&tree));
        }
        Ok(output)
    }

    /// Run the line-command loop until `quit` or end of input
    ///
    /// Every event the core emits is echoed to `output` as
    /// `event: <kind> <json>`, interleaved with command responses.
    pub fn run_shell<R, W>(&self, input: R, output: Arc<Mutex<W>>) -> Result<(), ApiError>
    where
        R: BufRead,
        W: Write + Send + 'static,
    {
        let subscriptions: Vec<_> = EventKind::ALL
            .iter()
            .map(|kind| {
                let sink = Arc::clone(&output);
                self.api.subscribe(*kind, move |event| {
                    let payload = serde_json::to_string(event).unwrap_or_default();
                    let _ = writeln!(sink.lock(), "event: {} {}", event.kind().as_str(), payload);
                })
            })
            .collect();

        let result = self.shell_loop(input, &output);

        if self.api.status().state == crate::daemon::DaemonState::Running {
            let _ = self.api.stop_daemon();
        }
        self.api.wait_for_idle(IDLE_TIMEOUT);
        for id in subscriptions {
            self.api.unsubscribe(id);
        }
        result
    }

    fn shell_loop<R, W>(&self, input: R, output: &Arc<Mutex<W>>) -> Result<(), ApiError>
    where
        R: BufRead,
        W: Write,
    {
        for line in input.lines() {
            let line = line?;
            let response = match parse_shell_line(&line) {
                Ok(None) => continue,
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => match self.execute_shell_command(&command) {
                    Ok(text) => text,
                    Err(e) => format!("error: {}", map_error(&e)),
                },
                Err(message) => format!("error: {}", message),
            };
            if !response.is_empty() {
                writeln!(output.lock(), "{}", response)?;
            }
        }
        Ok(())
    }

    /// Execute one shell command and return its response text
    pub fn execute_shell_command(&self, command: &ShellCommand) -> Result<String, ApiError> {
        match command {
            ShellCommand::Add { path, recursive } => {
                self.api.add_file_to_tree(path, *recursive)?;
                Ok(format!("tracking {}", path.display()))
            }
            ShellCommand::Remove { path } => {
                self.api.remove_file_from_tree(path)?;
                Ok(format!("removed {}", path.display()))
            }
            ShellCommand::Tracking { path } => Ok(self.api.is_tracking(path).to_string()),
            ShellCommand::List => Ok(format_tracked_text(&self.api.tracked())),
            ShellCommand::Start { period_secs } => {
                let secs = period_secs.unwrap_or(self.api.default_period_secs());
                self.api.start_daemon(secs)?;
                Ok(format!("daemon started (period {}s)", secs))
            }
            ShellCommand::Stop => {
                self.api.stop_daemon()?;
                Ok("daemon stopped".to_string())
            }
            ShellCommand::Period { period_secs } => {
                self.api.update_period(*period_secs)?;
                Ok(format!("period set to {}s", period_secs))
            }
            ShellCommand::Kill => {
                self.api.kill_daemon()?;
                Ok("daemon killed".to_string())
            }
            ShellCommand::Log => Ok(self.api.get_daemon_log()),
            ShellCommand::Status => Ok(format_status_text(&self.api.status())),
            ShellCommand::Trigger => Ok(if self.api.trigger_rebuild()? {
                "rebuild started".to_string()
            } else {
                "rebuild already in progress".to_string()
            }),
            ShellCommand::Help => Ok(SHELL_HELP.to_string()),
            ShellCommand::Quit => Ok(String::new()),
        }
    }
}
