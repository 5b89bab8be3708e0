use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("tab.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

const VALID_CONFIG: &str = r#"
topic = "code review of the payments module"
opening_message = "kick off the review"

[[agents]]
agent_id = "claude"
kind = "claude-code"
command = "claude"
args = ["--print", "--output-format", "stream-json"]
working_dir = "."
turn_timeout = 120
supports_resume = true
transport = "line_json_stdout"
strategy = "builtin"

[[agents]]
agent_id = "codex"
kind = "codex"
command = "codex"
args = ["exec"]
working_dir = "."
turn_timeout = 120
supports_resume = true
transport = "line_json_stdout"
strategy = "builtin"

[policy]
policy_id = "default"
file_access = [{ glob = "**/*", read = true, write = true, execute = false }]
approval_required_tools = []
approval_timeout = 60

[policy.sandbox]
mode = "workspace_write"
network_access = false

[policy.resource_limits]
max_turns = 10
max_wall_clock = 600
max_cost_units = 5.0
max_consecutive_failures = 3
"#;

#[test]
fn validate_accepts_a_well_formed_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, VALID_CONFIG);

    Command::cargo_bin("tab")
        .unwrap()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok"));
}

#[test]
fn validate_rejects_a_missing_file() {
    Command::cargo_bin("tab")
        .unwrap()
        .arg("validate")
        .arg("--config")
        .arg("/nonexistent/tab.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_a_zero_max_turns_policy() {
    let dir = tempfile::tempdir().unwrap();
    let bad = VALID_CONFIG.replace("max_turns = 10", "max_turns = 0");
    let config = write_config(&dir, &bad);

    Command::cargo_bin("tab")
        .unwrap()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn run_requires_at_least_two_participants() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, VALID_CONFIG);

    Command::cargo_bin("tab")
        .unwrap()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .arg("--participants")
        .arg("claude")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least two participants"));
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("tab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"));
}
