//! CLI shell: line commands for an external collaborator driving the core over stdin.

use std::path::PathBuf;

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add { path: PathBuf, recursive: bool },
    Remove { path: PathBuf },
    Tracking { path: PathBuf },
    List,
    Start { period_secs: Option<u64> },
    Stop,
    Period { period_secs: u64 },
    Kill,
    Log,
    Status,
    Trigger,
    Help,
    Quit,
}

pub const SHELL_HELP: &str = "\
add <path> [-r]    track a file or directory (-r: recursive)
remove <path>      stop tracking a path
tracking <path>    report whether a path is tracked
list               show tracked paths
start [secs]       start the daemon
stop               stop the daemon
period <secs>      change the daemon period
kill               terminate the daemon
log                print the daemon log
status             print daemon status
trigger            rebuild now
quit               leave the shell";

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse_shell_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "add" => {
            let (path, recursive) = if rest == "-r" {
                ("", true)
            } else if let Some(path) = rest.strip_suffix(" -r") {
                (path.trim(), true)
            } else if let Some(path) = rest.strip_prefix("-r ") {
                (path.trim(), true)
            } else {
                (rest, false)
            };
            ShellCommand::Add {
                path: require_path(verb, path)?,
                recursive,
            }
        }
        "remove" => ShellCommand::Remove {
            path: require_path(verb, rest)?,
        },
        "tracking" => ShellCommand::Tracking {
            path: require_path(verb, rest)?,
        },
        "list" => ShellCommand::List,
        "start" => ShellCommand::Start {
            period_secs: if rest.is_empty() {
                None
            } else {
                Some(parse_secs(rest)?)
            },
        },
        "stop" => ShellCommand::Stop,
        "period" => ShellCommand::Period {
            period_secs: parse_secs(rest)?,
        },
        "kill" => ShellCommand::Kill,
        "log" => ShellCommand::Log,
        "status" => ShellCommand::Status,
        "trigger" => ShellCommand::Trigger,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(Some(command))
}

fn require_path(verb: &str, rest: &str) -> Result<PathBuf, String> {
    if rest.is_empty() {
        Err(format!("{} requires a path", verb))
    } else {
        Ok(PathBuf::from(rest))
    }
}

fn parse_secs(value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("invalid period: {}", value))
}
