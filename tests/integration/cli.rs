//! Tests of the `kiln` binary: exit codes and what it prints.

use crate::fixtures::{TestProject, BAD_JS, OK_JS};

#[test]
fn test_build_succeeds_on_clean_tree() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS)]);

    let output = project.kiln(&["build"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Wrote 1 file(s) to lib\n"
    );
    assert!(project.exists("lib/ok.js"));
}

#[test]
fn test_lint_failure_exits_nonzero() {
    let project = TestProject::with_files(&[("src/bad.js", BAD_JS)]);

    let output = project.kiln(&["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "src/bad.js:1:13  no-undef  'undeclaredCat' is not defined.\n\n1 problem\n"
    );
    assert!(!project.exists("lib"));
}

#[test]
fn test_json_report() {
    let project = TestProject::with_files(&[("src/bad.js", BAD_JS)]);

    let output = project.kiln(&["lint", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let violations = report.as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["file"], "src/bad.js");
    assert_eq!(violations[0]["line"], 1);
    assert_eq!(violations[0]["col"], 13);
    assert_eq!(violations[0]["rule"], "no-undef");
}

#[test]
fn test_clean_json_lint_prints_nothing() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS)]);

    let output = project.kiln(&["lint", "--format", "json"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_negation_with_dotted_config_path() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        ("src/vendor/v.js", BAD_JS),
        (
            "kiln.toml",
            "[lint]\nsources = [\"src/**/*.js\", \"!src/vendor/*.js\"]\n",
        ),
    ]);

    let output = project.kiln(&["lint"]);
    assert!(output.status.success());
    let output = project.kiln(&["--config", "./kiln.toml", "lint"]);
    assert!(output.status.success());
    let output = project.kiln(&["--root", ".", "lint"]);
    assert!(output.status.success());
}

#[test]
fn test_config_flag_sets_root() {
    let project = TestProject::with_files(&[
        ("app/src/ok.js", OK_JS),
        ("app/kiln.toml", "[build]\ndest = \"out\"\n"),
    ]);

    let output = project.kiln(&["build", "--config", "app/kiln.toml"]);
    assert!(output.status.success());
    assert!(project.exists("app/out/ok.js"));
}

#[test]
fn test_tasks_listing() {
    let project = TestProject::new();

    let output = project.kiln(&["tasks"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "lint     Check sources against the lint rules\n\
         build    Transpile sources into the destination directory (after: lint)\n"
    );
}

#[test]
fn test_unknown_preset_reported() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        ("kiln.toml", "[build]\npresets = [\"es2016\"]\n"),
    ]);

    let output = project.kiln(&["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown preset: es2016"));
}

#[test]
fn test_debug_log_written() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS)]);

    let output = project.kiln(&["lint", "--debug"]);
    assert!(output.status.success());
    let log = project.read("kiln.log");
    assert!(log.contains("Kiln starting (debug mode enabled)"));
    assert!(log.contains("DEBUG"));
    assert!(log.contains("lint: completed"));
}
