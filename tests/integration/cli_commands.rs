//! Integration tests for the provebit binary

use super::test_utils::{flat_dir, nested_four_and_four};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn provebit(workspace: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_provebit"));
    cmd.arg("--workspace")
        .arg(workspace)
        .env("PROVEBIT_LOG", "off")
        .env("XDG_CONFIG_HOME", workspace.join("xdg"));
    cmd
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Test one-shot proving in text form
#[test]
fn test_prove_text() {
    let workspace = TempDir::new().unwrap();
    let dir = flat_dir(14);
    let output = provebit(workspace.path())
        .arg("prove")
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("root: "));
    assert!(stdout.contains("leaves: 14\nheight: 4\nsize: 29"));
}

/// Test one-shot proving in JSON form with the recursive flag
#[test]
fn test_prove_json_recursive() {
    let workspace = TempDir::new().unwrap();
    let dir = nested_four_and_four();
    let output = provebit(workspace.path())
        .args(["prove", "--recursive", "--format", "json"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["leaf_count"], 8);
    assert_eq!(value["height"], 3);
    assert_eq!(value["tracked"][0]["recursive"], true);
}

/// Test that a missing path fails with a readable message
#[test]
fn test_prove_missing_path() {
    let workspace = TempDir::new().unwrap();
    let output = provebit(workspace.path())
        .arg("prove")
        .arg(workspace.path().join("nope"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Path not found"));
}

/// Test that the workspace file's policies reach the printed config
#[test]
fn test_config_command_reflects_workspace_file() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join("provebit.toml"),
        "[daemon]\ndefault_period_secs = 7\n",
    )
    .unwrap();

    let output = provebit(workspace.path()).arg("config").output().unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("default_period_secs = 7"));
    assert!(stdout.contains("odd_node_policy = \"self_pair\""));
}

/// Test the run command for a fixed number of ticks
#[test]
fn test_run_ticks() {
    let workspace = TempDir::new().unwrap();
    let dir = flat_dir(8);
    let output = provebit(workspace.path())
        .args(["run", "--interval-ms", "20", "--ticks", "2"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.matches("[built]").count() >= 2);
    assert!(stdout.contains("leaves: 8\nheight: 3\nsize: 15"));
}

/// Test the shell over piped stdin
#[test]
fn test_shell_session() {
    let workspace = TempDir::new().unwrap();
    let dir = flat_dir(3);
    let mut child = provebit(workspace.path())
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let script = format!(
        "tracking {0}\nadd {0}\ntracking {0}\nstatus\nquit\n",
        dir.path().display()
    );
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    let responses: Vec<&str> = stdout.lines().filter(|l| !l.starts_with("event:")).collect();
    assert_eq!(responses[0], "false");
    assert!(responses[1].starts_with("tracking "));
    assert_eq!(responses[2], "true");
    assert_eq!(responses[3], "state: stopped");
    assert!(stdout.contains("event: tracking_set_changed"));
}
