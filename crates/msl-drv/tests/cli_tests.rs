//! CLI Interface E2E Tests
//!
//! Exercises the `msl` binary as a subprocess: script mode's exit codes
//! (§6), the REPL's prompt/output loop over piped stdin, and the usage
//! error for a malformed invocation.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn msl_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_msl"))
}

/// A well-formed script runs and prints its result; exit code is 0.
#[test]
fn test_script_runs_to_completion() {
    let mut cmd = Command::new(msl_bin());
    cmd.arg(fixtures_dir().join("arithmetic.msl"));

    cmd.assert().success().stdout("14.000000\n");
}

/// A runtime error part-way through a script does not change the exit
/// code — only lex/parse errors do (§6). Output produced before the
/// error still reaches stdout; the exception message goes to stderr.
#[test]
fn test_runtime_error_keeps_exit_code_zero() {
    let mut cmd = Command::new(msl_bin());
    cmd.arg(fixtures_dir().join("runtime_error.msl"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("before"))
        .stdout(predicate::str::contains("after").not())
        .stderr(predicate::str::contains("RuntimeException"));
}

/// A lex/parse failure exits 65 and never reaches the evaluator.
#[test]
fn test_parse_error_exits_65() {
    let mut cmd = Command::new(msl_bin());
    cmd.arg(fixtures_dir().join("parse_error.msl"));

    cmd.assert()
        .code(65)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty().not());
}

/// A script path that cannot be opened exits 74.
#[test]
fn test_missing_file_exits_74() {
    let temp_dir = TempDir::new().expect("failed to create temp directory");
    let missing = temp_dir.path().join("does_not_exist.msl");

    let mut cmd = Command::new(msl_bin());
    cmd.arg(&missing);

    cmd.assert().code(74);
}

/// More than one positional argument is a usage error, exit 64.
#[test]
fn test_too_many_arguments_exits_64() {
    let mut cmd = Command::new(msl_bin());
    cmd.arg("one.msl").arg("two.msl");

    cmd.assert()
        .code(64)
        .stderr(predicate::str::contains("Usage"));
}

/// With no arguments, the binary enters the REPL: it prompts with
/// `"> "` before each line and echoes `print` output in between.
#[test]
fn test_repl_prompts_and_evaluates_each_line() {
    let mut cmd = Command::new(msl_bin());
    cmd.write_stdin("print 1 + 1;\nprint \"done\";\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("> "))
        .stdout(predicate::str::contains("2.000000"))
        .stdout(predicate::str::contains("done"));
}

/// Variables persist across REPL lines — one evaluator runs for the
/// whole session, not a fresh one per line.
#[test]
fn test_repl_persists_state_across_lines() {
    let mut cmd = Command::new(msl_bin());
    cmd.write_stdin("let x = 10;\nprint x + 5;\n");

    cmd.assert().success().stdout(predicate::str::contains("15.000000"));
}
