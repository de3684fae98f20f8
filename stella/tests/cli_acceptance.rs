use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use stella_core::Database;
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("stella/stella.db")
    }

    fn write_config(&self, toml: &str) {
        let dir = self.xdg_config.join("stella");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), toml).expect("failed to write config");
    }
}

fn run_stella(env: &CliTestEnv, args: &[&str], stdin: &str) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("stella"));

    let mut child = Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to execute stella: {e}"));

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child
        .wait_with_output()
        .unwrap_or_else(|e| panic!("failed to wait for stella: {e}"))
}

fn assert_success(args: &[&str], output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return stdout;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "stella {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn modules_lists_builtin_catalog() {
    let env = CliTestEnv::new();
    let stdout = assert_success(&["modules"], &run_stella(&env, &["modules"], ""));

    assert!(stdout.contains("core-conditioning"));
    assert!(stdout.contains("eva-fundamentals"));
    assert!(stdout.contains("plank"));
}

#[test]
fn config_shows_xdg_paths_and_defaults() {
    let env = CliTestEnv::new();
    let stdout = assert_success(&["config"], &run_stella(&env, &["config"], ""));

    assert!(stdout.contains(&env.db_path().display().to_string()));
    assert!(stdout.contains("tick_ms = 1000"));
    assert!(stdout.contains("mode = \"mock\""));
}

#[test]
fn invalid_config_is_rejected() {
    let env = CliTestEnv::new();
    env.write_config("[guidance]\nmode = \"remote\"\n");

    let output = run_stella(&env, &["modules"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("server_url"), "stderr:\n{stderr}");
}

#[test]
fn ask_answers_by_keyword_in_mock_mode() {
    let env = CliTestEnv::new();
    let args = ["ask", "what", "heart", "rate", "should", "I", "target?"];
    let stdout = assert_success(&args, &run_stella(&env, &args, ""));
    assert!(stdout.contains("120 and 150 bpm"), "stdout:\n{stdout}");
}

#[test]
fn guidance_prioritizes_high_heart_rate() {
    let env = CliTestEnv::new();
    let args = ["guidance", "balance", "--heart-rate", "170", "--json"];
    let stdout = assert_success(&args, &run_stella(&env, &args, ""));

    let record: serde_json::Value = serde_json::from_str(&stdout).expect("guidance json");
    assert_eq!(record["priority"], "high");
    assert!(record["actionItems"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn offline_remote_question_is_queued_then_kept_on_replay() {
    let env = CliTestEnv::new();
    // Nothing listens on this port; keep retries short
    env.write_config(
        "[guidance]\nmode = \"remote\"\nserver_url = \"http://127.0.0.1:9\"\nmax_retries = 0\ntimeout_secs = 2\n",
    );

    let args = ["ask", "how", "do", "I", "recover?"];
    let stdout = assert_success(&args, &run_stella(&env, &args, ""));
    assert!(stdout.contains("queued"), "stdout:\n{stdout}");

    let stdout = assert_success(&["replay"], &run_stella(&env, &["replay"], ""));
    assert!(stdout.contains("1 still queued"), "stdout:\n{stdout}");

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    assert_eq!(db.pending_question_count().unwrap(), 1);
}

#[test]
fn train_session_completes_exercise_and_prints_summary() {
    let env = CliTestEnv::new();
    let args = ["train", "core-conditioning", "--seed", "3"];
    let stdout = assert_success(&args, &run_stella(&env, &args, "c plank 180\ne\n"));

    assert!(stdout.contains("\"module_id\": \"core-conditioning\""), "stdout:\n{stdout}");
    assert!(stdout.contains("\"exercise\": \"plank\""));
    assert!(stdout.contains("\"duration_secs\": 180"));
    assert!(stdout.contains("Credits earned: 10"));
}

#[test]
fn train_unknown_module_fails() {
    let env = CliTestEnv::new();
    let output = run_stella(&env, &["train", "zero-g-ballet"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("zero-g-ballet"));
}

#[test]
fn assess_walks_and_submits_locally() {
    let env = CliTestEnv::new();
    // mission-specific: role (options), duration, readiness scale
    let args = ["assess", "--type", "mission-specific"];
    let stdout = assert_success(&args, &run_stella(&env, &args, "1\n6 months\n8\n"));
    assert!(stdout.contains("Assessment submitted:"), "stdout:\n{stdout}");

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let submissions = db.list_submissions().expect("failed to list submissions");
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].assessment_type, "mission-specific");
}

#[test]
fn assess_quit_keeps_answers_for_later() {
    let env = CliTestEnv::new();
    let args = ["assess"];
    let stdout = assert_success(&args, &run_stella(&env, &args, "7\nq\n"));
    assert!(stdout.contains("Answers saved"));

    let stdout = assert_success(&args, &run_stella(&env, &args, "q\n"));
    assert!(stdout.contains("Restored 1 saved answer(s)."), "stdout:\n{stdout}");
}
