//! ES module syntax to CommonJS.
//!
//! Only top-level `import`/`export` statements are rewritten. Exported
//! declarations stay in place and their `exports.name = name;` assignments
//! are appended at the end of the module. Later assignments to an exported
//! binding also update `exports`, so importers see the current value.

use std::collections::{HashMap, HashSet};

use crate::js::syntax::{
    declarations, is_asi_boundary, is_reserved, parse_import, pattern_names, split_commas, visit,
    ImportDecl, Level,
};
use crate::js::{parse, parse_nodes, print, Fragment, Node, Token, TokenKind};
use crate::transpile::passes::{
    is_parameter_list, splice, Helper, PassContext, ASSIGNMENT_OPS,
};
use crate::{Error, Result};

const ES_MODULE_MARKER: &str =
    "Object.defineProperty(exports, '__esModule', {\n  value: true\n});";

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    let nodes = std::mem::take(&mut program.nodes);
    let mut out: Vec<Node> = Vec::new();
    // (exported name, local expression), assigned at the end of the module.
    let mut exports: Vec<(String, String)> = Vec::new();
    let mut has_exports = false;

    let mut i = 0;
    while i < nodes.len() {
        let node = &nodes[i];
        if node.is_ident("import") {
            if let Some(decl) = parse_import(&nodes, i) {
                let code = import_code(&decl, ctx);
                push_code(&mut out, &code, node.leading())?;
                i = decl.end;
                continue;
            }
        }
        if node.is_ident("export") {
            has_exports = true;
            i = lower_export(&nodes, i, ctx, &mut out, &mut exports)?;
            continue;
        }
        out.push(node.clone());
        i += 1;
    }

    strip_use_strict(&mut out);
    update_live_bindings(&mut out, &exports)?;

    let mut text = String::from("'use strict';\n\n");
    if has_exports {
        text.push_str(ES_MODULE_MARKER);
        text.push('\n');
    }
    let body = print(&Fragment {
        nodes: out,
        trailing: std::mem::take(&mut program.trailing),
    });
    text.push_str(body.trim_start());

    if !exports.is_empty() {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        for (name, local) in &exports {
            text.push_str(&format!("exports.{} = {};\n", name, local));
        }
    }

    *program = parse(&text)?;
    Ok(())
}

fn push_code(out: &mut Vec<Node>, code: &str, leading: &str) -> Result<()> {
    let mut nodes = parse_nodes(code)?;
    if let Some(first) = nodes.first_mut() {
        first.first_token_mut().leading = leading.to_string();
    }
    out.extend(nodes);
    Ok(())
}

/// Drop an existing `'use strict'` directive; one is always emitted.
fn strip_use_strict(out: &mut Vec<Node>) {
    let is_directive = out.first().is_some_and(|node| {
        node.token().is_some_and(|t| {
            t.kind == TokenKind::Str && (t.text == "'use strict'" || t.text == "\"use strict\"")
        })
    });
    if is_directive {
        let end = if out.get(1).is_some_and(|n| n.is_punct(";")) { 2 } else { 1 };
        out.drain(..end);
    }
}

/// `_name` for a module specifier: `'./cat-utils.js'` → `_catUtils`.
fn module_ref_base(source: &str) -> String {
    let specifier = source.trim_matches(['\'', '"']);
    let file = specifier.rsplit('/').next().unwrap_or(specifier);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };

    let mut name = String::from("_");
    for (i, part) in stem
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .filter(|part| !part.is_empty())
        .enumerate()
    {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                name.push(first);
            } else {
                name.extend(first.to_uppercase());
            }
            name.push_str(chars.as_str());
        }
    }
    if name == "_" {
        name.push_str("module");
    }
    name
}

fn import_code(decl: &ImportDecl, ctx: &mut PassContext) -> String {
    let require = format!("require({})", decl.source);

    if decl.namespace.is_none() && decl.named.is_empty() {
        return match &decl.default {
            Some(local) => {
                ctx.use_helper(Helper::InteropRequireDefault);
                format!("var {} = _interopRequireDefault({}).default;", local, require)
            }
            None => format!("{};", require),
        };
    }

    let module = match &decl.namespace {
        Some(namespace) => namespace.clone(),
        None => ctx.fresh_name(&module_ref_base(&decl.source)),
    };
    let mut lines = vec![format!("var {} = {};", module, require)];
    if let Some(local) = &decl.default {
        ctx.use_helper(Helper::InteropRequireDefault);
        lines.push(format!(
            "var {} = _interopRequireDefault({}).default;",
            local, module
        ));
    }
    for (imported, local) in &decl.named {
        lines.push(format!("var {} = {}.{};", local, module, imported));
    }
    lines.join("\n")
}

/// Rewrite the `export` at `start`; returns the index to continue from.
fn lower_export(
    nodes: &[Node],
    start: usize,
    ctx: &mut PassContext,
    out: &mut Vec<Node>,
    exports: &mut Vec<(String, String)>,
) -> Result<usize> {
    let leading = nodes[start].leading();
    let Some(next) = nodes.get(start + 1) else {
        return Err(malformed(&nodes[start]));
    };

    // export default ...
    if next.is_ident("default") {
        let after = start + 2;
        if let Some(name) = declared_name(nodes, after) {
            exports.push(("default".to_string(), name));
            push_with_leading(out, nodes.get(after), leading);
            return Ok(after + 1);
        }
        push_code(out, "exports.default =", leading)?;
        // An anonymous function or class is an expression here; without a
        // `;` a following `(` line would call it.
        if let Some(end) = anonymous_declaration_end(nodes, after) {
            out.extend(nodes[after..end].iter().cloned());
            if !nodes.get(end).is_some_and(|n| n.is_punct(";")) {
                out.push(Node::Token(Token::punct(";", "")));
            }
            return Ok(end);
        }
        return Ok(after);
    }

    // export { a as b } [from 'm'];
    if let Some(group) = next.group().filter(|g| g.open.text == "{") {
        let specifiers = export_specifiers(group.children.as_slice())?;
        let from = nodes.get(start + 2).is_some_and(|n| n.is_ident("from"));
        if !from {
            exports.extend(specifiers.into_iter().map(|(local, exported)| (exported, local)));
            return Ok(skip_semicolon(nodes, start + 2));
        }
        let source = module_source(nodes, start + 3)?;
        let module = ctx.fresh_name(&module_ref_base(&source));
        let mut lines = vec![format!("var {} = require({});", module, source)];
        for (local, exported) in specifiers {
            lines.push(format!("exports.{} = {}.{};", exported, module, local));
        }
        push_code(out, &lines.join("\n"), leading)?;
        return Ok(skip_semicolon(nodes, start + 4));
    }

    // export * from 'm'; export * as ns from 'm';
    if next.is_punct("*") {
        if nodes.get(start + 2).is_some_and(|n| n.is_ident("as")) {
            let namespace = nodes
                .get(start + 3)
                .and_then(Node::ident)
                .ok_or_else(|| malformed(&nodes[start]))?;
            let source = module_source(nodes, start + 5)?;
            push_code(
                out,
                &format!("exports.{} = require({});", namespace, source),
                leading,
            )?;
            return Ok(skip_semicolon(nodes, start + 6));
        }
        let source = module_source(nodes, start + 3)?;
        let module = ctx.fresh_name(&module_ref_base(&source));
        let code = format!(
            "var {0} = require({1});\nObject.keys({0}).forEach(function (key) {{\n  if (key === 'default' || key === '__esModule') return;\n  exports[key] = {0}[key];\n}});",
            module, source
        );
        push_code(out, &code, leading)?;
        return Ok(skip_semicolon(nodes, start + 4));
    }

    // export var/let/const ...
    if next.is_ident("var") || next.is_ident("let") || next.is_ident("const") {
        let mut names = Vec::new();
        for declarator in declarations(nodes, start + 1).declarators {
            pattern_names(&nodes[declarator.pattern], &mut names);
        }
        exports.extend(names.into_iter().map(|name| (name.clone(), name)));
        push_with_leading(out, Some(next), leading);
        return Ok(start + 2);
    }

    // export function / class
    if let Some(name) = declared_name(nodes, start + 1) {
        exports.push((name.clone(), name));
        push_with_leading(out, Some(next), leading);
        return Ok(start + 2);
    }

    Err(malformed(&nodes[start]))
}

/// Name of the `function`/`class` declaration starting at `i`, if any.
fn declared_name(nodes: &[Node], i: usize) -> Option<String> {
    let mut k = i;
    if nodes.get(k)?.is_ident("async") {
        k += 1;
    }
    if nodes.get(k)?.is_ident("function") {
        k += 1;
        if nodes.get(k)?.is_punct("*") {
            k += 1;
        }
    } else if nodes.get(k)?.is_ident("class") && k == i {
        k += 1;
    } else {
        return None;
    }
    nodes
        .get(k)?
        .ident()
        .filter(|name| *name != "extends")
        .map(str::to_string)
}

/// End of an anonymous `function`/`class` starting at `i`: just past its body.
fn anonymous_declaration_end(nodes: &[Node], i: usize) -> Option<usize> {
    let mut k = i;
    if nodes.get(k)?.is_ident("async") {
        k += 1;
    }
    if nodes.get(k)?.is_ident("function") {
        k += 1;
        if nodes.get(k)?.is_punct("*") {
            k += 1;
        }
        if !nodes.get(k)?.is_group("(") || !nodes.get(k + 1)?.is_group("{") {
            return None;
        }
        return Some(k + 2);
    }
    if k == i && nodes.get(k)?.is_ident("class") {
        let body = nodes[k..].iter().position(|n| n.is_group("{"))?;
        return Some(k + body + 1);
    }
    None
}

fn push_with_leading(out: &mut Vec<Node>, node: Option<&Node>, leading: &str) {
    if let Some(node) = node {
        let mut node = node.clone();
        node.first_token_mut().leading = leading.to_string();
        out.push(node);
    }
}

/// `(local, exported)` pairs of an export clause.
fn export_specifiers(children: &[Node]) -> Result<Vec<(String, String)>> {
    let mut specifiers = Vec::new();
    for element in split_commas(children) {
        let names: Vec<&str> = element.iter().filter_map(Node::ident).collect();
        match names.as_slice() {
            [local] => specifiers.push((local.to_string(), local.to_string())),
            [local, "as", exported] => {
                specifiers.push((local.to_string(), exported.to_string()))
            }
            _ => {
                return Err(Error::Unsupported(
                    "malformed export specifier".to_string(),
                ))
            }
        }
    }
    Ok(specifiers)
}

fn module_source(nodes: &[Node], i: usize) -> Result<String> {
    match nodes.get(i) {
        Some(Node::Token(token)) if token.kind == TokenKind::Str => Ok(token.text.clone()),
        _ => Err(Error::Unsupported(
            "expected a module specifier string".to_string(),
        )),
    }
}

fn skip_semicolon(nodes: &[Node], i: usize) -> usize {
    if nodes.get(i).is_some_and(|n| n.is_punct(";")) {
        i + 1
    } else {
        i
    }
}

// ========== Live bindings ==========

/// After every assignment to an exported local, assign `exports` too:
/// `count += 1` becomes `exports.count = count += 1`.
///
/// Updates that cannot be rewritten in place (destructuring targets,
/// postfix updates whose value is used, loop heads, bindings shadowed by
/// another declaration of the same name) fail the transform.
fn update_live_bindings(nodes: &mut Vec<Node>, exports: &[(String, String)]) -> Result<()> {
    let mut live: HashMap<String, Vec<String>> = HashMap::new();
    for (exported, local) in exports {
        if local.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            live.entry(local.clone()).or_default().push(exported.clone());
        }
    }
    if live.is_empty() {
        return Ok(());
    }
    let shadowed: HashSet<String> = declaration_counts(nodes)
        .into_iter()
        .filter(|(name, count)| *count > 1 && live.contains_key(name))
        .map(|(name, _)| name)
        .collect();
    rewrite_assignments(nodes, &live, &shadowed, Context::Statements)
}

/// What kind of sequence [`rewrite_assignments`] is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Program or block: may hold expression statements.
    Statements,
    Expression,
    /// Parameter list or declaration pattern: names here are bindings.
    Binding,
}

/// How often each name is bound by a declaration or parameter.
fn declaration_counts(nodes: &[Node]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    visit(nodes, Level::Program, &mut |seq, _| {
        let mut names = Vec::new();
        for (i, node) in seq.iter().enumerate() {
            let after_dot = i > 0 && seq[i - 1].is_punct(".");
            match node {
                Node::Token(_) if after_dot => {}
                Node::Token(token) => match token.text.as_str() {
                    "var" | "let" | "const" => {
                        for declarator in declarations(seq, i).declarators {
                            pattern_names(&seq[declarator.pattern], &mut names);
                        }
                    }
                    "function" | "class" => {
                        let next = seq.get(i + 1).filter(|n| !n.is_punct("*"));
                        let next = next.or_else(|| seq.get(i + 2));
                        if let Some(name) = next.and_then(Node::ident) {
                            names.push(name.to_string());
                        }
                    }
                    _ if seq.get(i + 1).is_some_and(|n| n.is_punct("=>")) => {
                        pattern_names(node, &mut names);
                    }
                    _ => {}
                },
                Node::Group(_) if node.is_group("(") && is_parameter_list(seq, i) => {
                    pattern_names(node, &mut names);
                }
                Node::Group(_) => {}
            }
        }
        for name in names {
            *counts.entry(name).or_default() += 1;
        }
    });
    counts
}

fn rewrite_assignments(
    nodes: &mut Vec<Node>,
    live: &HashMap<String, Vec<String>>,
    shadowed: &HashSet<String>,
    context: Context,
) -> Result<()> {
    let declared: HashSet<usize> = declarator_patterns(nodes);

    for i in 0..nodes.len() {
        if nodes[i].is_ident("for") {
            check_loop_head(nodes.get(i + 1), live)?;
        }
        let child = if context == Context::Binding
            || declared.contains(&i)
            || (nodes[i].is_group("(") && is_parameter_list(nodes, i))
        {
            Context::Binding
        } else if nodes[i].is_group("{") {
            Context::Statements
        } else {
            Context::Expression
        };
        if child != Context::Binding && is_destructuring_target(nodes, i) {
            let mut names = Vec::new();
            pattern_names(&nodes[i], &mut names);
            if let Some(name) = names.iter().find(|name| live.contains_key(*name)) {
                return Err(unsupported_update(name, &nodes[i]));
            }
        }
        match &mut nodes[i] {
            Node::Group(group) => {
                rewrite_assignments(&mut group.children, live, shadowed, child)?;
            }
            Node::Token(token) => {
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        rewrite_assignments(&mut expr.nodes, live, shadowed, Context::Expression)?;
                    }
                }
            }
        }
    }
    if context == Context::Binding {
        return Ok(());
    }

    let mut i = 0;
    while i < nodes.len() {
        let Some(name) = nodes[i].ident().filter(|name| live.contains_key(*name)) else {
            i += 1;
            continue;
        };
        let name = name.to_string();
        let prev = i.checked_sub(1).map(|p| &nodes[p]);
        let next = nodes.get(i + 1);
        if declared.contains(&i)
            || prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?."))
            || next.is_some_and(|n| n.is_punct("=>"))
        {
            i += 1;
            continue;
        }

        let targets = exports_chain(&live[&name]);
        let is_assignment = next.is_some_and(|n| ASSIGNMENT_OPS.iter().any(|op| n.is_punct(op)));
        let is_prefix = prev.is_some_and(|p| p.is_punct("++") || p.is_punct("--"))
            && !(i >= 2 && ends_operand(&nodes[i - 2]) && !nodes[i - 1].has_newline_before());
        let is_postfix = next
            .is_some_and(|n| (n.is_punct("++") || n.is_punct("--")) && !n.has_newline_before());

        if !(is_assignment || is_prefix || is_postfix) {
            i += 1;
            continue;
        }
        if shadowed.contains(&name) {
            return Err(unsupported_update(&name, &nodes[i]));
        }

        if is_assignment {
            i += splice(nodes, i..i + 1, &format!("{}{}", targets, name))?;
        } else if is_prefix {
            let op = nodes[i - 1].first_token().text.clone();
            let code = format!("({}{}{})", targets, op, name);
            splice(nodes, i - 1..i + 1, &code)?;
        } else if context == Context::Statements && is_statement(nodes, i, i + 2) {
            let op = nodes[i + 1].first_token().text.clone();
            i += splice(nodes, i..i + 2, &format!("{}{}{}", targets, op, name))?;
        } else {
            return Err(unsupported_update(&name, &nodes[i]));
        }
    }
    Ok(())
}

/// `exports.a = exports.b = ` for every name `local` is exported as.
fn exports_chain(exported: &[String]) -> String {
    exported
        .iter()
        .map(|name| format!("exports.{} = ", name))
        .collect()
}

/// Indices of declarator bindings in `var`/`let`/`const` declarations.
fn declarator_patterns(nodes: &[Node]) -> HashSet<usize> {
    let mut patterns = HashSet::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_keyword = node.is_ident("var") || node.is_ident("let") || node.is_ident("const");
        if is_keyword && !(i > 0 && nodes[i - 1].is_punct(".")) {
            patterns.extend(declarations(nodes, i).declarators.iter().map(|d| d.pattern));
        }
    }
    patterns
}

/// `for (name of xs)` / `for (name in o)` assigning an exported binding.
fn check_loop_head(head: Option<&Node>, live: &HashMap<String, Vec<String>>) -> Result<()> {
    let Some(Node::Group(group)) = head else {
        return Ok(());
    };
    if let [target, op, ..] = group.children.as_slice() {
        if op.is_ident("of") || op.is_ident("in") {
            if let Some(name) = target.ident().filter(|name| live.contains_key(*name)) {
                return Err(unsupported_update(name, target));
            }
        }
    }
    Ok(())
}

/// Whether the `[`/`{` group at `i` is the target of a plain assignment.
fn is_destructuring_target(nodes: &[Node], i: usize) -> bool {
    let is_pattern_group = nodes[i].is_group("[") || nodes[i].is_group("{");
    let assigned = nodes.get(i + 1).is_some_and(|n| n.is_punct("="));
    let starts_operand = match i.checked_sub(1).map(|p| &nodes[p]) {
        None => true,
        Some(prev) => !ends_operand(prev) || is_asi_boundary(prev, &nodes[i]),
    };
    is_pattern_group && assigned && starts_operand
}

fn ends_operand(node: &Node) -> bool {
    match node {
        Node::Group(_) => true,
        Node::Token(token) => match token.kind {
            TokenKind::Punct => false,
            TokenKind::Ident => {
                !is_reserved(&token.text)
                    || matches!(token.text.as_str(), "this" | "null" | "true" | "false")
            }
            _ => true,
        },
    }
}

/// Whether `nodes[start..end]` forms a whole expression statement.
fn is_statement(nodes: &[Node], start: usize, end: usize) -> bool {
    let starts = match start.checked_sub(1).map(|p| &nodes[p]) {
        None => true,
        Some(prev) => {
            prev.is_punct(";")
                || prev.is_group("{")
                || prev.is_ident("else")
                || prev.is_ident("do")
                || (prev.is_group("(")
                    && start >= 2
                    && ["if", "for", "while", "with"]
                        .iter()
                        .any(|k| nodes[start - 2].is_ident(k)))
                || is_asi_boundary(prev, &nodes[start])
        }
    };
    let ends = match nodes.get(end) {
        None => true,
        Some(next) => next.is_punct(";") || next.has_newline_before(),
    };
    starts && ends
}

fn unsupported_update(name: &str, node: &Node) -> Error {
    let (line, col) = node.position();
    Error::Unsupported(format!(
        "cannot keep exported binding `{}` live after this update at {}:{}",
        name, line, col
    ))
}

fn malformed(node: &Node) -> Error {
    let (line, col) = node.position();
    Error::Unsupported(format!("unsupported export at {}:{}", line, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(source: &str) -> Result<String> {
        let mut program = parse(source)?;
        let mut ctx = PassContext::new("React.createElement", &program);
        run(&mut program, &mut ctx)?;
        Ok(print(&program))
    }

    #[test]
    fn test_script_gets_use_strict_only() {
        assert_eq!(lower("run();\n").unwrap(), "'use strict';\n\nrun();\n");
        assert_eq!(
            lower("'use strict';\nrun();\n").unwrap(),
            "'use strict';\n\nrun();\n"
        );
    }

    #[test]
    fn test_imports() {
        let source = "import React from 'react';\nimport { render, unmount as drop } from 'react-dom';\nimport * as utils from './utils';\nimport './styles.css';\n";
        assert_eq!(
            lower(source).unwrap(),
            "'use strict';\n\n\
             var React = _interopRequireDefault(require('react')).default;\n\
             var _reactDom = require('react-dom');\n\
             var render = _reactDom.render;\n\
             var drop = _reactDom.unmount;\n\
             var utils = require('./utils');\n\
             require('./styles.css');\n"
        );
    }

    #[test]
    fn test_default_import_requests_interop_helper() {
        let mut program = parse("import React from 'react';\n").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        run(&mut program, &mut ctx).unwrap();
        assert_eq!(
            ctx.helpers().collect::<Vec<_>>(),
            vec![Helper::InteropRequireDefault]
        );
    }

    #[test]
    fn test_exports() {
        let source = "export const a = 1, { b } = o;\nexport function f() {}\nexport default class Cat {}\nexport { a as alias };\n";
        assert_eq!(
            lower(source).unwrap(),
            "'use strict';\n\n\
             Object.defineProperty(exports, '__esModule', {\n  value: true\n});\n\
             const a = 1, { b } = o;\n\
             function f() {}\n\
             class Cat {}\n\
             exports.a = a;\n\
             exports.b = b;\n\
             exports.f = f;\n\
             exports.default = Cat;\n\
             exports.alias = a;\n"
        );
    }

    #[test]
    fn test_export_default_expression_and_reexport() {
        let source = "export default { name: 'x' };\nexport { x } from './x';\n";
        assert_eq!(
            lower(source).unwrap(),
            "'use strict';\n\n\
             Object.defineProperty(exports, '__esModule', {\n  value: true\n});\n\
             exports.default = { name: 'x' };\n\
             var _x = require('./x');\n\
             exports.x = _x.x;\n"
        );
    }

    #[test]
    fn test_export_default_anonymous_function_is_terminated() {
        let source = "export default function () { return 1; }\n(function () {})();\n";
        assert_eq!(
            lower(source).unwrap(),
            "'use strict';\n\n\
             Object.defineProperty(exports, '__esModule', {\n  value: true\n});\n\
             exports.default = function () { return 1; };\n\
             (function () {})();\n"
        );
        let source = "export default class {}\n(run)();\n";
        assert!(lower(source)
            .unwrap()
            .contains("exports.default = class {};\n(run)();"));
        // An explicit semicolon is not doubled.
        let source = "export default function () {};\n";
        assert!(lower(source)
            .unwrap()
            .ends_with("exports.default = function () {};\n"));
    }

    #[test]
    fn test_exported_binding_stays_live() {
        let source = "export let count = 0;\nexport function inc() { count += 1; }\nexport function reset() {\n  count = 0\n  count++\n  return ++count;\n}\n";
        assert_eq!(
            lower(source).unwrap(),
            "'use strict';\n\n\
             Object.defineProperty(exports, '__esModule', {\n  value: true\n});\n\
             let count = 0;\n\
             function inc() { exports.count = count += 1; }\n\
             function reset() {\n  exports.count = count = 0\n  exports.count = ++count\n  return (exports.count = ++count);\n}\n\
             exports.count = count;\n\
             exports.inc = inc;\n\
             exports.reset = reset;\n"
        );
    }

    #[test]
    fn test_renamed_export_updates_every_name() {
        let source = "let n = 1;\nn *= 2;\nexport { n, n as total };\n";
        assert!(lower(source)
            .unwrap()
            .contains("exports.n = exports.total = n *= 2;"));
    }

    #[test]
    fn test_untrackable_updates_fail() {
        for source in [
            "export let n = 0;\nf(n++);\n",
            "export let n = 0;\n[n] = [1];\n",
            "export let n = 0;\nfor (n of xs) {}\n",
            "export let n = 0;\nfunction g(n) { n = 2; }\n",
        ] {
            assert!(
                matches!(lower(source), Err(Error::Unsupported(_))),
                "{}",
                source
            );
        }
        // Reading an exported binding or a shadowing parameter is fine.
        assert!(lower("export let n = 0;\nfunction g(m) { return n + m; }\n").is_ok());
    }

    #[test]
    fn test_module_ref_base() {
        assert_eq!(module_ref_base("'react-dom'"), "_reactDom");
        assert_eq!(module_ref_base("'./lib/cat.utils.js'"), "_catUtils");
        assert_eq!(module_ref_base("'../'"), "_module");
    }
}
