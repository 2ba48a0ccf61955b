//! Runtime behaviour of transpiled code.
//!
//! Each case is lowered with the `es2015` preset and executed with
//! `node`; what it prints must match what the untranspiled source prints.
//! The cases are skipped when `node` is not installed.

use std::process::Command;

use tempfile::TempDir;

use kiln::config::BuildConfig;
use kiln::transpile::Transpiler;

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn es2015(source: &str) -> String {
    let config = BuildConfig {
        presets: vec!["es2015".to_string()],
        ..Default::default()
    };
    Transpiler::new(&config)
        .unwrap()
        .transform(source)
        .unwrap_or_else(|e| panic!("transform failed: {}\n{}", e, source))
}

/// Transpile `source`, run it and return its standard output.
fn run_lowered(source: &str) -> Option<String> {
    if !node_available() {
        eprintln!("node not found; skipping");
        return None;
    }
    let lowered = es2015(source);
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("out.js");
    std::fs::write(&path, &lowered).expect("Failed to write file");
    let output = Command::new("node")
        .arg(&path)
        .output()
        .expect("Failed to run node");
    assert!(
        output.status.success(),
        "node failed:\n{}\n--- output ---\n{}",
        String::from_utf8_lossy(&output.stderr),
        lowered
    );
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn assert_prints(source: &str, expected: &str) {
    if let Some(stdout) = run_lowered(source) {
        assert_eq!(stdout, expected, "for source:\n{}", source);
    }
}

#[test]
fn test_loop_closures_capture_each_iteration() {
    assert_prints(
        "const fns = [];\n\
         for (let i = 0; i < 3; i++) {\n  fns.push(() => i);\n}\n\
         console.log(fns.map((f) => f()).join(','));\n",
        "0,1,2\n",
    );
}

#[test]
fn test_shadowed_block_binding() {
    assert_prints(
        "let x = 1;\n{\n  let x = 2;\n  console.log(x);\n}\nconsole.log(x);\n",
        "2\n1\n",
    );
}

#[test]
fn test_arguments_in_arrow_belong_to_enclosing_function() {
    assert_prints(
        "function outer() {\n  const f = () => arguments[0];\n  return f('inner');\n}\n\
         console.log(outer('outer'));\n",
        "outer\n",
    );
}

#[test]
fn test_default_function_export_followed_by_parenthesized_statement() {
    assert_prints(
        "export default function () {\n  return 1;\n}\n\
         (function () {\n  console.log('iife');\n})();\n\
         console.log(typeof exports.default);\n",
        "iife\nfunction\n",
    );
}

#[test]
fn test_reassigned_export_is_live() {
    assert_prints(
        "export let count = 0;\n\
         export function bump() {\n  count += 1;\n}\n\
         bump();\n\
         console.log(exports.count);\n",
        "1\n",
    );
}

#[test]
fn test_classes_with_inheritance() {
    assert_prints(
        "class Animal {\n  constructor(name) {\n    this.name = name;\n  }\n\n  \
           speak() {\n    return this.name + ' speaks';\n  }\n\n  \
           static create(name) {\n    return new this(name);\n  }\n}\n\n\
         class Dog extends Animal {\n  speak() {\n    return super.speak() + ' loudly';\n  }\n\n  \
           get upper() {\n    return this.name.toUpperCase();\n  }\n}\n\n\
         const d = Dog.create('rex');\n\
         console.log(d.speak(), d.upper, d instanceof Animal);\n",
        "rex speaks loudly REX true\n",
    );
}

#[test]
fn test_parameters_spread_and_for_of() {
    assert_prints(
        "function f(a, b = 2, ...rest) {\n  return a + b + rest.length;\n}\n\
         const ys = [0, ...[1, 2]];\n\
         let sum = 0;\n\
         for (const y of ys) {\n  sum += y;\n}\n\
         console.log(f(1), f(1, 1, 9, 9), Math.max(...ys), sum);\n",
        "3 4 2 3\n",
    );
}

#[test]
fn test_demo_class_module() {
    let source = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/demo/src/cats.js"))
        .expect("Failed to read demo source");
    let lowered = es2015(&source);
    for modern in ["class Cat", "`", "export "] {
        assert!(!lowered.contains(modern), "{:?} left in output:\n{}", modern, lowered);
    }
    assert_prints(
        &format!("{}\nconsole.log(new exports.default('Tom').meow());\n", source),
        "Meow meow, I am Tom\n",
    );
}
