// End-to-end tests for the rosterjoin binary.
// Run with: cargo test -p rosterjoin-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const FPL_CSV: &str = include_str!("../../recon/tests/fixtures/fpl.csv");
const UNDERSTAT_JSON: &str = include_str!("../../recon/tests/fixtures/understat.json");
const SEASON_TOML: &str = include_str!("../../recon/tests/fixtures/season.recon.toml");

fn rosterjoin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rosterjoin"))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Temp dir holding the season fixtures; returns the dir and the config path.
fn season_dir(config: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fpl.csv"), FPL_CSV).unwrap();
    std::fs::write(dir.path().join("understat.json"), UNDERSTAT_JSON).unwrap();
    let config_path = dir.path().join("season.recon.toml");
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn run(args: &[&str], config: &Path) -> Output {
    rosterjoin().arg("run").arg(config).args(args).output().unwrap()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_json_to_stdout() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = run(&["--json"], &config);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let result: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(result["meta"]["config_name"], "FPL x Understat 2019/20");
    assert_eq!(result["summary"]["matched"], 7);
    assert_eq!(result["summary"]["merged"], 7);
    assert_eq!(result["summary"]["unresolved_teams"][0], "Leicester");
    assert_eq!(result["matches"].as_array().unwrap().len(), 7);
    assert_eq!(result["unmatched"].as_array().unwrap().len(), 3);
    assert_eq!(result["merged"]["rows"].as_array().unwrap().len(), 7);

    let err = stderr(&out);
    assert!(err.contains("7 matched"), "stderr: {err}");
    assert!(err.contains("unresolved teams: Leicester"), "stderr: {err}");
}

#[test]
fn run_verbose_logs_inputs() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = rosterjoin()
        .env_remove("RUST_LOG")
        .args(["-v", "run"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("config 'FPL x Understat 2019/20'"), "stderr: {err}");
    assert!(err.contains("reading"), "stderr: {err}");
    assert!(err.contains("understat.json"), "stderr: {err}");
}

#[test]
fn run_quiet_hides_engine_warnings() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = rosterjoin()
        .env_remove("RUST_LOG")
        .args(["-q", "run"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    // The unresolved Leicester label is a warn! in the engine.
    assert!(!stderr(&out).contains("has no counterpart"));
}

#[test]
fn run_without_json_keeps_stdout_empty() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = run(&[], &config);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).is_empty());
}

#[test]
fn run_writes_configured_outputs_next_to_config() {
    let (dir, config) = season_dir(SEASON_TOML);
    let out = run(&[], &config);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let json = std::fs::read_to_string(dir.path().join("season.json")).unwrap();
    let result: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(result["summary"]["primary_records"], 10);

    let csv = std::fs::read_to_string(dir.path().join("season.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "name,team,total_points,minutes,assists_x,points_per_90,time,goals,xG,assists_y,meta.position"
    );
    assert_eq!(lines.count(), 7);
    assert!(stderr(&out).contains("wrote"));
}

#[test]
fn run_flags_override_output_paths() {
    let (dir, config) = season_dir(SEASON_TOML);
    let merged = dir.path().join("custom-merged.csv");
    let matches = dir.path().join("custom-matches.csv");
    let out = run(
        &[
            "--csv",
            merged.to_str().unwrap(),
            "--matches",
            matches.to_str().unwrap(),
        ],
        &config,
    );
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    assert!(merged.exists());
    assert!(!dir.path().join("season.csv").exists());

    let matches_csv = std::fs::read_to_string(&matches).unwrap();
    let mut lines = matches_csv.lines();
    assert_eq!(lines.next().unwrap(), "primary_name,secondary_name,team,score");
    assert_eq!(
        lines.next().unwrap(),
        "Bruno Fernandes,Bruno Miguel Borges Fernandes,Man Utd,309"
    );
    assert_eq!(lines.count(), 6);
}

#[test]
fn run_strict_exits_5_on_drops() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = run(&["--strict"], &config);
    assert_eq!(out.status.code(), Some(5));
    let err = stderr(&out);
    assert!(err.contains("3 primary record(s) left unmatched"), "stderr: {err}");
    assert!(err.contains("hint:"));
}

#[test]
fn run_missing_data_file_exits_4() {
    let (dir, config) = season_dir(SEASON_TOML);
    std::fs::remove_file(dir.path().join("understat.json")).unwrap();
    let out = run(&[], &config);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("cannot read"));
}

#[test]
fn run_missing_column_exits_4_with_hint() {
    let toml = SEASON_TOML.replace("team = \"team_title\"", "team = \"club\"");
    let (_dir, config) = season_dir(&toml);
    let out = run(&[], &config);
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("missing column 'club'"), "stderr: {err}");
    assert!(err.contains("[secondary.columns]"), "stderr: {err}");
}

#[test]
fn run_invalid_config_exits_3() {
    let toml = SEASON_TOML.replace("threshold = 260", "threshold = 401");
    let (_dir, config) = season_dir(&toml);
    let out = run(&[], &config);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("threshold"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_fixture() {
    let (_dir, config) = season_dir(SEASON_TOML);
    let out = rosterjoin().arg("validate").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let err = stderr(&out);
    assert!(err.starts_with("valid: 'FPL x Understat 2019/20'"), "stderr: {err}");
    assert!(err.contains("threshold 260"));
}

#[test]
fn validate_rejects_bad_toml() {
    let (_dir, config) = season_dir("name = ");
    let out = rosterjoin().arg("validate").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("config parse error"));
}

#[test]
fn validate_missing_config_exits_4() {
    let out = rosterjoin()
        .args(["validate", "/nonexistent/season.recon.toml"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("cannot read config"));
}

// ---------------------------------------------------------------------------
// score / teams
// ---------------------------------------------------------------------------

#[test]
fn score_prints_breakdown() {
    let out = rosterjoin()
        .args(["score", "Fernandes, Bruno", "Bruno Fernandes"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("token_set_ratio   100"), "stdout: {text}");
    assert!(text.contains("total             318"), "stdout: {text}");
}

#[test]
fn score_json() {
    let out = rosterjoin()
        .args(["score", "Sadio Mane", "Sadio Mané", "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let v: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(v["ratio"], 90);
    assert_eq!(v["token_sort_ratio"], 100);
    assert_eq!(v["total"], 380);
}

#[test]
fn score_rejects_blank_name() {
    let out = rosterjoin().args(["score", " ", "Harry Kane"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn teams_builtin_aliases() {
    let out = rosterjoin()
        .args(["teams", "Tottenham", "Manchester United, Everton", "Burnley"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Tottenham\tSpurs",
            "Manchester United, Everton\tMan Utd",
            "Burnley\tBurnley",
        ]
    );
}

#[test]
fn teams_with_config_aliases() {
    let toml = SEASON_TOML.replace(
        "threshold = 260",
        "threshold = 260\n\n[teams.aliases]\n\"Leicester\" = \"Leicester City\"",
    );
    let (_dir, config) = season_dir(&toml);
    let out = rosterjoin()
        .args(["teams", "Leicester", "Tottenham", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Leicester\tLeicester City\nTottenham\tSpurs\n");
}

#[test]
fn no_subcommand_is_usage_error() {
    let out = rosterjoin().output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}
