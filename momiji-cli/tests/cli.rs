//! End-to-end CLI tests (spec §10.4, reusing `faxt`'s `assert_cmd` +
//! `predicates` + `tempfile` pattern): spawn the built binary, feed it a
//! script or a REPL session, assert stdout/stderr/exit code.

use assert_cmd::Command;
use predicates::prelude::*;

fn momiji() -> Command {
    Command::cargo_bin("momiji").expect("binary should build")
}

#[test]
fn runs_a_script_and_prints_output() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("hello.momiji");
    std::fs::write(&script, "print 1 + 2;").unwrap();

    momiji()
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn exits_65_on_compile_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bad.momiji");
    std::fs::write(&script, "local x = ;").unwrap();

    momiji()
        .arg(&script)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("SyntaxError"));
}

#[test]
fn exits_70_on_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("undefined.momiji");
    std::fs::write(&script, "print nope;").unwrap();

    momiji()
        .arg(&script)
        .assert()
        .code(70)
        .stderr(predicate::str::contains("RuntimeError"));
}

#[test]
fn exits_74_on_missing_file() {
    momiji()
        .arg("/nonexistent/script.momiji")
        .assert()
        .code(74);
}

#[test]
fn exits_64_on_too_many_arguments() {
    momiji()
        .arg("one.momiji")
        .arg("two.momiji")
        .assert()
        .code(64);
}

#[test]
fn repl_evaluates_a_submitted_statement() {
    momiji()
        .write_stdin("print 2 + 2;\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains('4'));
}

#[test]
fn repl_persists_globals_across_submissions() {
    momiji()
        .write_stdin("global x = 10;\n\nprint x + 1;\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("11"));
}
