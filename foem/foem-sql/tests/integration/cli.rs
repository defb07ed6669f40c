#![cfg(all(not(target_family = "wasm"), feature = "cli"))]

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use insta_cmd::assert_cmd_snapshot;
use insta_cmd::get_cargo_bin;

#[test]
fn list_dialects() {
    assert_cmd_snapshot!(foem_command().arg("list-dialects"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    ansi
    bigquery
    databricks
    duckdb
    generic
    hive
    mssql
    mysql
    postgres
    redshift
    snowflake
    sqlite

    ----- stderr -----
    "###);
}

#[test]
fn transpile() {
    assert_cmd_snapshot!(foem_command()
        .args(["transpile", "--from", "postgres", "--to", "databricks"])
        .pass_stdin("SELECT person_id FROM visit_occurrence WHERE CAST(EXTRACT(EPOCH FROM (visit_end_date - visit_start_date)) / 86400 AS BIGINT) >= %(days)s"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    SELECT person_id FROM visit_occurrence WHERE DATEDIFF(visit_end_date, visit_start_date) >= :days
    ----- stderr -----
    "###);
}

#[test]
fn transpile_env_dialects() {
    assert_cmd_snapshot!(foem_command()
        .args(["transpile"])
        .env("FOEM_SOURCE_DIALECT", "postgres")
        .env("FOEM_TARGET_DIALECT", "postgres")
        .pass_stdin("SELECT (a - b) > 1"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    SELECT (a - b) > 1
    ----- stderr -----
    "###);
}

#[test]
fn transpile_bad_dialect() {
    assert_cmd_snapshot!(foem_command()
        .args(["transpile", "--to", "oracle"])
        .pass_stdin("SELECT 1"), @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    Error transpiling query: dialect `"oracle"` not found
    ↳ Hint: available dialects: ansi, bigquery, databricks, duckdb, generic, hive, mssql, mysql, postgres, redshift, snowflake, sqlite
    "###);
}

#[test]
fn transpile_lenient() {
    let output = run_with_stdin(
        foem_command().args(["-v", "transpile", "--lenient"]),
        "SELECT * FROM",
    );

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "SELECT * FROM");
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .starts_with("[WARN] Error transpiling query: invalid postgres SQL"));
}

#[test]
fn transpile_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("query.sql");
    let output = dir.path().join("query.databricks.sql");
    fs::write(&input, "SELECT * FROM death WHERE ABS(death_date - index_date) < 30").unwrap();

    let status = foem_command()
        .arg("transpile")
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "SELECT * FROM death WHERE ABS(DATEDIFF(death_date, index_date)) < 30"
    );
}

#[test]
fn debug_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("query.sql");
    let log = dir.path().join("log.json");
    fs::write(&input, "SELECT * FROM death WHERE (death_date - index_date) < 30").unwrap();

    let status = foem_command()
        .args(["transpile", "--debug-log"])
        .arg(&log)
        .arg(&input)
        .status()
        .unwrap();
    assert!(status.success());

    let log: serde_json::Value = serde_json::from_str(&fs::read_to_string(&log).unwrap()).unwrap();
    let kinds: Vec<_> = log["entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["kind"].as_object())
        .flat_map(|kind| kind.keys().cloned())
        .collect();
    assert!(kinds.contains(&"ReprSource".to_string()));
    assert!(kinds.contains(&"Rewrite".to_string()));
    assert!(kinds.contains(&"ReprSql".to_string()));
}

#[test]
fn parse() {
    let output = run_with_stdin(
        foem_command().args(["parse", "--format", "json"]),
        "SELECT 1",
    );
    assert!(output.status.success());

    let statements: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(statements[0].get("Query").is_some());
}

fn run_with_stdin(cmd: &mut Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn foem_command() -> Command {
    let mut cmd = Command::new(get_cargo_bin("foem-sql"));
    normalize_foem(&mut cmd);
    cmd
}

fn normalize_foem(cmd: &mut Command) -> &mut Command {
    cmd
        // We don't want `foem-sql` to output color for our snapshot tests.
        .env_remove("CLICOLOR_FORCE")
        .env("NO_COLOR", "1")
        .args(["--color=never"])
        // Nor to be affected by the user's environment.
        .env_remove("RUST_BACKTRACE")
        .env_remove("RUST_LOG")
        .env_remove("FOEM_SOURCE_DIALECT")
        .env_remove("FOEM_TARGET_DIALECT")
        .env_remove("FOEM_DEBUG_LOG")
}
