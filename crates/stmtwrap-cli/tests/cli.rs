use std::path::Path;
use std::process::Command;

use stmtwrap_cli::args::parse_args;
use stmtwrap_cli::config::Config;
use stmtwrap_cli::{run, CliError};
use stmtwrap_db::{ConnectOptions, DbError, ErrorMode};

fn config_for(path: &Path, mode: ErrorMode) -> Config {
    let mut config = Config {
        database: ConnectOptions::new(path.to_string_lossy()),
        ..Config::default()
    };
    config.wrapper.error_mode = mode;
    config
}

fn run_line(config: &Config, argv: &[&str]) -> Result<String, CliError> {
    let invocation = parse_args(std::iter::once("stmtwrap").chain(argv.iter().copied()))
        .expect("arguments should parse");
    let mut out = Vec::new();
    run(config, &invocation, &mut out)?;
    Ok(String::from_utf8(out).expect("output should be utf-8"))
}

fn seeded(dir: &Path) -> Config {
    let config = config_for(&dir.join("cli.db"), ErrorMode::Propagate);
    run_line(
        &config,
        &["CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)"],
    )
    .expect("create");
    for (name, age) in [("ada", "36"), ("alan", "41"), ("grace", "85")] {
        run_line(
            &config,
            &["INSERT INTO people (name, age) VALUES (?, ?)", name, age],
        )
        .expect("insert");
    }
    config
}

// ── library entry point ─────────────────────────────────────────────

#[test]
fn write_statement_prints_counters() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = seeded(dir.path());

    let out = run_line(
        &config,
        &["INSERT INTO people (name, age) VALUES (?, ?)", "linus", "28"],
    )
    .expect("insert");
    assert_eq!(out, "{\"affected_rows\":1,\"last_insert_id\":4}\n");
}

#[test]
fn select_prints_one_json_object_per_row() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = seeded(dir.path());

    let out = run_line(
        &config,
        &["SELECT name, age FROM people WHERE age > ? ORDER BY id", "40"],
    )
    .expect("select");
    assert_eq!(
        out,
        "{\"name\":\"alan\",\"age\":41}\n{\"name\":\"grace\",\"age\":85}\n"
    );
}

#[test]
fn nested_list_parameter_binds_as_sequence() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = seeded(dir.path());

    let out = run_line(
        &config,
        &["SELECT id FROM people WHERE name IN (?, ?) ORDER BY id", "[ada,grace]"],
    )
    .expect("select");
    assert_eq!(out, "{\"id\":1}\n{\"id\":3}\n");
}

#[test]
fn num_rows_flag_prints_count() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = seeded(dir.path());

    let out = run_line(&config, &["--num-rows", "SELECT * FROM people"]).expect("select");
    assert_eq!(out, "{\"num_rows\":3}\n");
}

#[test]
fn propagate_mode_returns_syntax_error() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = seeded(dir.path());

    let err = run_line(&config, &["SELEC * FROM people"]).expect_err("should fail");
    assert!(matches!(err, CliError::Db(DbError::Syntax { .. })), "got {err:?}");
}

#[test]
fn silent_mode_prints_nothing_on_failure() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_for(&dir.path().join("silent.db"), ErrorMode::Silent);

    let out = run_line(&config, &["SELECT * FROM nowhere"]).expect("silent mode succeeds");
    assert!(out.is_empty());
}

// ── binary ──────────────────────────────────────────────────────────

fn binary(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stmtwrap"));
    cmd.env("STMTWRAP_CONFIG_PATH", dir.join("absent.toml"))
        .env("STMTWRAP_DB_NAME", dir.join("bin.db"))
        .env_remove("STMTWRAP_ERROR_MODE")
        .env_remove("STMTWRAP_DB_CHARSET")
        .env("STMTWRAP_LOG_LEVEL", "off");
    cmd
}

#[test]
fn binary_prints_rows() {
    let dir = tempfile::tempdir().expect("should create temp dir");

    let output = binary(dir.path())
        .args(["SELECT ? AS greeting, ? AS answer", "hi", "42"])
        .output()
        .expect("binary should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"greeting\":\"hi\",\"answer\":42}\n"
    );
}

#[test]
fn binary_abort_mode_exits_with_labelled_message() {
    let dir = tempfile::tempdir().expect("should create temp dir");

    let output = binary(dir.path())
        .env("STMTWRAP_ERROR_MODE", "abort")
        .args(["SELEC 1"])
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SyntaxError: Unable to prepare statement"),
        "stderr: {stderr}"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn binary_usage_error_exits_with_two() {
    let dir = tempfile::tempdir().expect("should create temp dir");

    let output = binary(dir.path())
        .args(["--bogus"])
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unexpected argument '--bogus'"));
}
