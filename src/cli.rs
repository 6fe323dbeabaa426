//! CLI domain: parse, route, shell, output, and presentation only.
//! No domain orchestration; single route table dispatches to the proof API.

mod output;
mod parse;
mod presentation;
mod route;
mod shell;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_status_text, format_tracked_text, format_tree_json, format_tree_text};
pub use route::RunContext;
pub use shell::{parse_shell_line, ShellCommand};
