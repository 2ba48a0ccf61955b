//! End-to-end pipeline tests.
//!
//! Each test lays out a project, runs `lint` or `build` through the
//! standard pipeline and checks the verdict and the destination tree.

use std::sync::Arc;

use kiln::core::TaskStatus;
use kiln::lint::{lint_files, Linter};
use kiln::source::SourceSet;
use kiln::tasks::{BUILD_TASK, LINT_TASK};
use kiln::Error;

use crate::fixtures::{TestProject, BAD_JS, OK_JS};

#[tokio::test]
async fn test_clean_tree_lints_and_builds() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS)]);

    let report = project.run(LINT_TASK).await.unwrap();
    assert_eq!(report.status_of(LINT_TASK), Some(&TaskStatus::Completed));
    assert!(!project.exists("lib"));

    let report = project.run(BUILD_TASK).await.unwrap();
    assert_eq!(report.status_of(LINT_TASK), Some(&TaskStatus::Completed));
    assert_eq!(report.status_of(BUILD_TASK), Some(&TaskStatus::Completed));
    assert_eq!(project.list("lib"), vec!["ok.js"]);
    assert_eq!(
        project.read("lib/ok.js"),
        "'use strict';\n\nvar cats = ['Felix', 'Tom'];\nconsole.log(cats.length);\n"
    );
}

#[tokio::test]
async fn test_undeclared_variable_fails_gate() {
    let project = TestProject::with_files(&[("src/bad.js", BAD_JS)]);
    let config = project.config();

    let files = SourceSet::new(config.lint.sources.clone())
        .resolve(&project.path)
        .unwrap();
    let linter = Arc::new(Linter::new(&config.lint).unwrap());
    let report = lint_files(linter, &files, &project.path).await.unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].file, "src/bad.js");
    assert_eq!(report.violations[0].rule, "no-undef");

    let err = project.run(LINT_TASK).await.unwrap_err();
    assert!(matches!(err, Error::LintFailed(1)));
}

#[tokio::test]
async fn test_lint_failure_produces_no_output() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS), ("src/bad.js", BAD_JS)]);

    let err = project.run(BUILD_TASK).await.unwrap_err();
    assert!(matches!(err, Error::LintFailed(1)));
    assert!(!project.exists("lib"));
}

#[tokio::test]
async fn test_parse_error_fails_gate() {
    let project = TestProject::with_files(&[("src/broken.js", "const s = 'open;\n")]);

    let err = project.run(BUILD_TASK).await.unwrap_err();
    assert!(matches!(err, Error::LintFailed(1)));
    assert!(!project.exists("lib"));
}

#[tokio::test]
async fn test_build_is_idempotent() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        (
            "src/shapes.js",
            "export const area = ({ w, h }) => w * h;\nexport const label = (s) => `${s.name}: ${area(s)}`;\n",
        ),
    ]);

    project.run(BUILD_TASK).await.unwrap();
    let first = (project.read("lib/ok.js"), project.read("lib/shapes.js"));
    project.run(BUILD_TASK).await.unwrap();
    let second = (project.read("lib/ok.js"), project.read("lib/shapes.js"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_nested_paths_are_preserved() {
    let project = TestProject::with_files(&[("src/a/b.js", OK_JS), ("src/c.js", OK_JS)]);

    project.run(BUILD_TASK).await.unwrap();
    assert_eq!(project.list("lib"), vec!["a/b.js", "c.js"]);
}

#[tokio::test]
async fn test_es2015_and_jsx_are_lowered() {
    let project = TestProject::with_files(&[(
        "src/app.js",
        "import React from 'react';\n\
         import { render } from 'react-dom';\n\n\
         const Cat = ({ name, lives = 9 }) => <li className=\"cat\">{name} ({lives})</li>;\n\n\
         export default function App({ cats }) {\n  \
           return <ul>{cats.map((c) => <Cat name={c} />)}</ul>;\n\
         }\n\n\
         render(<App cats={['Felix']} />, document.getElementById('root'));\n",
    )]);
    project.write("kiln.toml", "[lint]\ndisabled_rules = [\"quotes\"]\n");

    project.run(BUILD_TASK).await.unwrap();
    let out = project.read("lib/app.js");
    assert!(out.starts_with("'use strict';\n\n"));
    assert!(out.contains("React.createElement('ul', null"));
    assert!(out.contains("React.createElement(Cat, { name: c })"));
    assert!(out.contains("exports.default = App;"));
    assert!(out.contains("_interopRequireDefault"));
    for modern in ["=>", "const ", "let ", "import ", "export ", "<li", "`"] {
        assert!(!out.contains(modern), "{:?} left in output:\n{}", modern, out);
    }
}

#[tokio::test]
async fn test_config_controls_sources_and_dest() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        ("src/ok.test.js", "describe();\n"),
        ("dist/stale.js", "old"),
        (
            "kiln.toml",
            "[lint]\nsources = [\"src/**/*.js\", \"!src/**/*.test.js\"]\n\n\
             [build]\nsources = [\"src/**/*.js\", \"!src/**/*.test.js\"]\n\
             presets = [\"block-scoping\"]\ndest = \"dist\"\nclean = true\n",
        ),
    ]);

    project.run(BUILD_TASK).await.unwrap();
    assert_eq!(project.list("dist"), vec!["ok.js"]);
    assert_eq!(
        project.read("dist/ok.js"),
        "var cats = ['Felix', 'Tom'];\nconsole.log(cats.length);\n"
    );
}

#[tokio::test]
async fn test_unknown_task() {
    let project = TestProject::with_files(&[("src/ok.js", OK_JS)]);
    let err = project.run("deploy").await.unwrap_err();
    assert!(matches!(err, Error::UnknownTask(name) if name == "deploy"));
}

#[tokio::test]
async fn test_unknown_preset() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        ("kiln.toml", "[build]\npresets = [\"es2016\"]\n"),
    ]);

    let err = project.run(BUILD_TASK).await.unwrap_err();
    assert!(matches!(err, Error::UnknownPreset(name) if name == "es2016"));
    assert!(!project.exists("lib"));
}

#[tokio::test]
async fn test_unsupported_syntax_names_file() {
    let project = TestProject::with_files(&[
        ("src/ok.js", OK_JS),
        ("src/tagged.js", "const html = String.raw;\nconsole.log(html`<b>`);\n"),
    ]);

    let err = project.run(BUILD_TASK).await.unwrap_err();
    match err {
        Error::Transform { path, .. } => assert!(path.ends_with("src/tagged.js")),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!project.exists("lib"));
}
