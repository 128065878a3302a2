use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.home.join(".claude/cpi-si/system/data/session")
    }

    fn start_session(&self, session_id: &str) {
        fs::create_dir_all(self.session_dir()).expect("failed to create session dir");
        fs::write(
            self.session_dir().join("current-log.json"),
            format!(
                r#"{{"session_id":"{}","instance_id":"nova_dawn","user_id":"ada"}}"#,
                session_id
            ),
        )
        .expect("failed to write session descriptor");
    }

    fn stream_path(&self, session_id: &str) -> PathBuf {
        self.session_dir()
            .join("activity")
            .join(format!("{}.jsonl", session_id))
    }

    fn stream_lines(&self, session_id: &str) -> Vec<serde_json::Value> {
        fs::read_to_string(self.stream_path(session_id))
            .expect("stream file should exist")
            .lines()
            .map(|l| serde_json::from_str(l).expect("line should be JSON"))
            .collect()
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("workmem"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute workmem: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "workmem {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn hook_commands_append_sanitized_events() {
    let env = CliTestEnv::new();
    env.start_session("s-cli");

    let cases: Vec<Vec<&str>> = vec![
        vec!["tool", "Edit", "src/app/main.rs"],
        vec!["tool", "Edit", "src/app/main.rs", "--failed"],
        vec!["command", "cargo test --workspace", "--exit-code", "101", "--duration-ms", "2500"],
        vec!["log", "SessionStart", "--context", "session-initialized"],
    ];
    for args in &cases {
        let output = run_bin(&env, args);
        assert_success(args, &output);
        assert!(output.stdout.is_empty(), "hook commands must stay quiet");
    }

    let lines = env.stream_lines("s-cli");
    assert_eq!(lines.len(), 4);

    assert_eq!(lines[0]["event_type"], "interaction");
    assert_eq!(lines[0]["context"], "main.rs");
    assert_eq!(lines[0]["extensions"]["result"], "success");
    assert_eq!(lines[1]["extensions"]["result"], "failure");

    assert_eq!(lines[2]["event_type"], "routine");
    assert_eq!(lines[2]["context"], "cargo");
    assert_eq!(lines[2]["extensions"]["result"], "failure");
    assert_eq!(lines[2]["extensions"]["duration_ms"], 2500);

    assert_eq!(lines[3]["event_type"], "SessionStart");
    assert_eq!(lines[3]["session_id"], "s-cli");
}

#[test]
fn hook_commands_are_silent_noops_without_session() {
    let env = CliTestEnv::new();

    let args = ["tool", "Read", "/etc/hosts"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(output.stdout.is_empty());
    assert!(!env.session_dir().join("activity").exists());
}

#[test]
fn hook_commands_exit_zero_when_stream_unwritable() {
    let env = CliTestEnv::new();
    env.start_session("s-blocked");
    fs::write(env.session_dir().join("activity"), "not a directory").unwrap();

    let args = ["log", "routine", "--context", "ls"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn show_and_summary_read_both_schemas() {
    let env = CliTestEnv::new();
    env.start_session("s-read");
    fs::create_dir_all(env.session_dir().join("activity")).unwrap();
    fs::write(
        env.stream_path("s-read"),
        concat!(
            r#"{"ts":"2025-11-04T09:00:00Z","tool":"Grep","ctx":"search","result":"success"}"#,
            "\n",
        ),
    )
    .unwrap();

    let args = ["command", "make", "--exit-code", "0"];
    assert_success(&args, &run_bin(&env, &args));

    let show = run_bin(&env, &["show"]);
    assert_success(&["show"], &show);
    let stdout = String::from_utf8_lossy(&show.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("Grep"));
    assert!(stdout.contains("[legacy]"));
    assert!(stdout.contains("routine"));

    let last = run_bin(&env, &["show", "--last", "1"]);
    assert_success(&["show", "--last", "1"], &last);
    assert_eq!(String::from_utf8_lossy(&last.stdout).lines().count(), 1);

    let summary = run_bin(&env, &["summary", "--session", "s-read"]);
    assert_success(&["summary", "--session", "s-read"], &summary);
    let stdout = String::from_utf8_lossy(&summary.stdout);
    assert!(stdout.contains("Events:          2"));
    assert!(stdout.contains("Legacy events:   1"));
    assert!(stdout.contains("Success rate:    100%"));
}

#[test]
fn show_without_session_fails_with_hint() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no active session"));
}

#[test]
fn whoami_reports_sentinel_and_paths() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["whoami"]);
    assert_success(&["whoami"], &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"session_id\": \"unknown\""));
    assert!(stdout.contains("no active session"));
    assert!(stdout.contains("current-log.json"));
    assert!(stdout.contains("Log file:"));
    assert!(stdout.contains("xdg-state/workmem/workmem."));
}

#[test]
fn show_rejects_session_outside_activity_dir() {
    let env = CliTestEnv::new();

    for session in ["../secret", "/etc/passwd", ""] {
        let output = run_bin(&env, &["show", "--session", session]);
        assert!(!output.status.success(), "--session {session:?} should fail");
        assert!(String::from_utf8_lossy(&output.stderr).contains("invalid session id"));
    }
}
