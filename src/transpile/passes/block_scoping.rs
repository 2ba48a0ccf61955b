//! `let` and `const` declarations to `var`.
//!
//! Turning a block binding into a function-scoped one is only safe when
//! nothing observes the difference, so before the keyword swap:
//!
//! - a loop body whose closures capture a per-iteration binding is moved
//!   into an immediately invoked function taking the loop bindings as
//!   parameters;
//! - a block binding whose name is also used outside its block, anywhere
//!   in the same function, is renamed to a fresh name;
//! - a `let` without initializer inside a loop body is reset to
//!   `undefined` on every iteration.
//!
//! Loop bodies that would change meaning inside a function (`break`,
//! `continue`, `return`, `arguments`, or an update of the loop variable)
//! fail the transform instead.

use std::ops::Range;

use crate::js::syntax::{declarations, is_reserved, pattern_names, statement_end, visit, visit_mut, Level};
use crate::js::{parse_nodes, print_trimmed, Fragment, Node, TokenKind};
use crate::transpile::passes::{
    is_function_body, is_variable_at, references_name, splice, uses_this, PassContext,
    ASSIGNMENT_OPS,
};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    wrap_loop_closures(&mut program.nodes)?;
    scope_function(&mut program.nodes, &[], ctx)?;
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        for i in 0..nodes.len() {
            if is_block_declaration(nodes, i) {
                if let Node::Token(token) = &mut nodes[i] {
                    token.text = "var".to_string();
                }
            }
        }
        Ok(())
    })
}

/// Whether `nodes[i]` is the `let`/`const` keyword of a declaration.
fn is_block_declaration(nodes: &[Node], i: usize) -> bool {
    let is_keyword = nodes[i].is_ident("let") || nodes[i].is_ident("const");
    let is_member = i > 0 && (nodes[i - 1].is_punct(".") || nodes[i - 1].is_punct("?."));
    let binds = nodes.get(i + 1).is_some_and(|next| {
        next.is_group("[")
            || next.is_group("{")
            || next.ident().is_some_and(|name| !is_reserved(name) || name == "let")
    });
    is_keyword && !is_member && binds
}

/// Names bound by the `let`/`const` declarations directly in `nodes`.
fn declared_in(nodes: &[Node]) -> Vec<String> {
    let mut names = Vec::new();
    for i in 0..nodes.len() {
        if is_block_declaration(nodes, i) {
            for declarator in declarations(nodes, i).declarators {
                pattern_names(&nodes[declarator.pattern], &mut names);
            }
        }
    }
    names
}

/// Names bound by `let`/`const` in a `for` head.
fn head_names(head: &Node) -> Vec<String> {
    let Node::Group(group) = head else {
        return Vec::new();
    };
    let children = &group.children;
    if !(children.first().is_some_and(|n| n.is_ident("let") || n.is_ident("const"))
        && is_block_declaration(children, 0))
    {
        return Vec::new();
    }
    let mut names = Vec::new();
    let is_in_of = children
        .get(2)
        .is_some_and(|n| n.is_ident("of") || n.is_ident("in"));
    if is_in_of {
        pattern_names(&children[1], &mut names);
    } else {
        for declarator in declarations(children, 0).declarators {
            pattern_names(&children[declarator.pattern], &mut names);
        }
    }
    names
}

/// Whether the group at `i` is the body of a loop (or, with `switch`, a
/// `switch` body), which is where unlabeled `break`/`continue` land.
fn is_loop_body(nodes: &[Node], i: usize, switch: bool) -> bool {
    if !nodes[i].is_group("{") {
        return false;
    }
    if i >= 1 && nodes[i - 1].is_ident("do") {
        return true;
    }
    let keywords: &[&str] = if switch {
        &["for", "while", "switch"]
    } else {
        &["for", "while"]
    };
    i >= 2 && nodes[i - 1].is_group("(") && keywords.iter().any(|k| nodes[i - 2].is_ident(k))
}

// ========== Loop closures ==========

fn wrap_loop_closures(nodes: &mut Vec<Node>) -> Result<()> {
    for node in nodes.iter_mut() {
        match node {
            Node::Group(group) => wrap_loop_closures(&mut group.children)?,
            Node::Token(token) => {
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        wrap_loop_closures(&mut expr.nodes)?;
                    }
                }
            }
        }
    }

    for i in 0..nodes.len() {
        let is_member = i > 0 && nodes[i - 1].is_punct(".");
        if is_member {
            continue;
        }
        let (body, head) = if nodes[i].is_ident("for") && nodes.get(i + 1).is_some_and(|n| n.is_group("(")) {
            (i + 2, Some(i + 1))
        } else if nodes[i].is_ident("while")
            && nodes.get(i + 1).is_some_and(|n| n.is_group("("))
            && !(i >= 2 && nodes[i - 2].is_ident("do"))
        {
            (i + 2, None)
        } else if nodes[i].is_ident("do") && nodes.get(i + 1).is_some_and(|n| n.is_group("{")) {
            (i + 1, None)
        } else {
            continue;
        };
        let Some(body_node) = nodes.get(body) else {
            continue;
        };

        let loop_vars = head.map(|h| head_names(&nodes[h])).unwrap_or_default();
        let Node::Group(block) = body_node else {
            let end = statement_end(nodes, body);
            if !loop_vars.is_empty() && captures(&nodes[body..end], &loop_vars) {
                return Err(closure_error(&nodes[i], "needs a block body"));
            }
            continue;
        };
        if block.open.text != "{" {
            continue;
        }

        let mut names = loop_vars.clone();
        collect_block_names(&block.children, &mut names);
        if names.is_empty() || !captures(&block.children, &names) {
            continue;
        }
        if escapes(&block.children, false) {
            return Err(closure_error(
                &nodes[i],
                "cannot contain break, continue, return or arguments",
            ));
        }
        let is_counting = head.is_some_and(|h| !is_in_of_head(&nodes[h]));
        if is_counting && assigns(&block.children, &loop_vars) {
            return Err(closure_error(&nodes[i], "cannot update the loop variable"));
        }

        let params = loop_vars.join(", ");
        let call = if uses_this(&block.children) {
            if params.is_empty() {
                ".call(this)".to_string()
            } else {
                format!(".call(this, {})", params)
            }
        } else {
            format!("({})", params)
        };
        let code = format!(
            "{{ (function ({}) {}){}; }}",
            params,
            print_trimmed(std::slice::from_ref(body_node)),
            call
        );
        splice(nodes, body..body + 1, &code)?;
    }
    Ok(())
}

fn is_in_of_head(head: &Node) -> bool {
    head.group().is_some_and(|group| {
        group
            .children
            .get(2)
            .is_some_and(|n| n.is_ident("of") || n.is_ident("in"))
    })
}

/// `let`/`const` names declared anywhere in a loop body, nested
/// functions excluded.
fn collect_block_names(nodes: &[Node], out: &mut Vec<String>) {
    out.extend(declared_in(nodes));
    for (i, node) in nodes.iter().enumerate() {
        if let Node::Group(group) = node {
            if !is_function_body(nodes, i) {
                collect_block_names(&group.children, out);
            }
        }
    }
}

/// Whether a function inside `nodes` refers to any of `names`.
fn captures(nodes: &[Node], names: &[String]) -> bool {
    nodes.iter().enumerate().any(|(i, node)| match node {
        Node::Group(group) if is_function_body(nodes, i) => {
            names.iter().any(|name| references_name(&group.children, name))
        }
        Node::Group(group) => captures(&group.children, names),
        Node::Token(token) => match &token.kind {
            TokenKind::Template(template) => {
                template.exprs.iter().any(|expr| captures(&expr.nodes, names))
            }
            _ => false,
        },
    })
}

/// Whether moving `nodes` into a function would change where control or
/// `arguments` goes. Nested functions are skipped; `break`/`continue`
/// inside a nested loop (or `break` in a nested `switch`) stay local.
fn escapes(nodes: &[Node], in_nested_loop: bool) -> bool {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Group(_) if is_function_body(nodes, i) => {}
            Node::Group(group) => {
                let nested = in_nested_loop || is_loop_body(nodes, i, true);
                if escapes(&group.children, nested) {
                    return true;
                }
            }
            Node::Token(token) => {
                if i > 0 && nodes[i - 1].is_punct(".") {
                    continue;
                }
                match &token.kind {
                    TokenKind::Ident => match token.text.as_str() {
                        "return" | "yield" | "await" | "arguments" => return true,
                        "break" | "continue" => {
                            let labeled = nodes.get(i + 1).is_some_and(|next| {
                                !next.has_newline_before()
                                    && next.ident().is_some_and(|name| !is_reserved(name))
                            });
                            if labeled || !in_nested_loop {
                                return true;
                            }
                        }
                        _ => {}
                    },
                    TokenKind::Template(template) => {
                        if template
                            .exprs
                            .iter()
                            .any(|expr| escapes(&expr.nodes, in_nested_loop))
                        {
                            return true;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    false
}

/// Whether any of `names` is assigned or updated anywhere in `nodes`.
fn assigns(nodes: &[Node], names: &[String]) -> bool {
    let mut found = false;
    visit(nodes, Level::Program, &mut |seq, _| {
        for i in 0..seq.len() {
            let Some(name) = seq[i].ident() else {
                continue;
            };
            if found || !names.iter().any(|n| n == name) || !is_variable_at(seq, i) {
                continue;
            }
            let next = seq.get(i + 1);
            let prev = i.checked_sub(1).map(|p| &seq[p]);
            found = next.is_some_and(|n| ASSIGNMENT_OPS.iter().any(|op| n.is_punct(op)))
                || next.is_some_and(|n| {
                    (n.is_punct("++") || n.is_punct("--")) && !n.has_newline_before()
                })
                || prev.is_some_and(|p| p.is_punct("++") || p.is_punct("--"));
        }
    });
    found
}

fn closure_error(keyword: &Node, reason: &str) -> Error {
    let (line, col) = keyword.position();
    Error::Unsupported(format!(
        "loop at {}:{} with closures over block bindings {}",
        line, col, reason
    ))
}

// ========== Shadowing ==========

/// A block, or a `for` head plus its body, that binds `names`.
#[derive(Debug)]
struct Region {
    /// Child indices from the function body to the sequence holding the
    /// region.
    parent: Vec<usize>,
    range: Range<usize>,
    names: Vec<String>,
    is_block: bool,
    in_loop: bool,
}

impl Region {
    /// Inner regions sort first.
    fn depth(&self) -> usize {
        self.parent.len() * 2 + usize::from(self.is_block)
    }
}

/// Rename block bindings that clash with other uses of their name in the
/// function whose body is `nodes` and whose parameters bind `outer`.
/// Nested functions are done first.
fn scope_function(nodes: &mut Vec<Node>, outer: &[String], ctx: &mut PassContext) -> Result<()> {
    scope_nested(nodes, ctx)?;

    let mut regions = Vec::new();
    collect_regions(nodes, &mut Vec::new(), false, &mut regions);
    regions.sort_by_key(|region| std::cmp::Reverse(region.depth()));

    for region in regions {
        let Some(seq) = sequence_ref(nodes, &region.parent) else {
            continue;
        };
        let clashing: Vec<&String> = region
            .names
            .iter()
            .filter(|name| {
                outer.contains(*name)
                    || count_uses(&seq[region.range.clone()], name) < count_uses(nodes, name)
            })
            .collect();
        let renames: Vec<(String, String)> = clashing
            .into_iter()
            .map(|name| (name.clone(), ctx.fresh_name(&format!("_{}", name))))
            .collect();

        let Some(seq) = sequence_at(nodes, &region.parent) else {
            continue;
        };
        for (name, fresh) in &renames {
            rename(&mut seq[region.range.clone()], name, fresh);
        }
        if region.is_block && region.in_loop {
            if let Some(Node::Group(block)) = seq.get_mut(region.range.start) {
                reset_each_iteration(&mut block.children)?;
            }
        }
    }
    Ok(())
}

fn scope_nested(nodes: &mut [Node], ctx: &mut PassContext) -> Result<()> {
    for i in 0..nodes.len() {
        let params = if is_function_body(nodes, i) {
            Some(parameter_names(nodes, i))
        } else {
            None
        };
        match &mut nodes[i] {
            Node::Group(group) => match params {
                Some(params) => scope_function(&mut group.children, &params, ctx)?,
                None => scope_nested(&mut group.children, ctx)?,
            },
            Node::Token(token) => {
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        scope_nested(&mut expr.nodes, ctx)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Names bound by the parameters of the function whose body is at `body`.
fn parameter_names(nodes: &[Node], body: usize) -> Vec<String> {
    let mut names = Vec::new();
    let params = if nodes[body - 1].is_punct("=>") {
        body.checked_sub(2).map(|p| &nodes[p])
    } else {
        Some(&nodes[body - 1])
    };
    if let Some(params) = params {
        pattern_names(params, &mut names);
    }
    names
}

fn collect_regions(nodes: &[Node], path: &mut Vec<usize>, in_loop: bool, out: &mut Vec<Region>) {
    for i in 0..nodes.len() {
        if is_function_body(nodes, i) {
            continue;
        }
        if nodes[i].is_ident("for") {
            if let Some(head) = nodes.get(i + 1).filter(|n| n.is_group("(")) {
                let names = head_names(head);
                if !names.is_empty() && i + 2 < nodes.len() {
                    let end = if nodes[i + 2].is_group("{") {
                        i + 3
                    } else {
                        statement_end(nodes, i + 2)
                    };
                    out.push(Region {
                        parent: path.clone(),
                        range: i + 1..end,
                        names,
                        is_block: false,
                        in_loop,
                    });
                }
            }
        }
        if let Node::Group(group) = &nodes[i] {
            let child_in_loop = in_loop || is_loop_body(nodes, i, false);
            if group.open.text == "{" {
                let names = declared_in(&group.children);
                if !names.is_empty() {
                    out.push(Region {
                        parent: path.clone(),
                        range: i..i + 1,
                        names,
                        is_block: true,
                        in_loop: child_in_loop,
                    });
                }
            }
            path.push(i);
            collect_regions(&group.children, path, child_in_loop, out);
            path.pop();
        }
    }
}

fn sequence_ref<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a [Node]> {
    let mut current = nodes;
    for &index in path {
        current = &current.get(index)?.group()?.children;
    }
    Some(current)
}

fn sequence_at<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    let mut current = nodes;
    for &index in path {
        current = match current.get_mut(index) {
            Some(Node::Group(group)) => &mut group.children,
            _ => return None,
        };
    }
    Some(current)
}

/// Uses of `name` as a variable, at any depth.
fn count_uses(nodes: &[Node], name: &str) -> usize {
    let mut count = 0;
    visit(nodes, Level::Program, &mut |seq, _| {
        count += (0..seq.len())
            .filter(|&i| seq[i].is_ident(name) && is_variable_at(seq, i))
            .count();
    });
    count
}

/// Rename every variable use of `name`. Bindings of the same name nested
/// inside the region are renamed along with their uses, which keeps them
/// consistent.
fn rename(nodes: &mut [Node], name: &str, fresh: &str) {
    for i in 0..nodes.len() {
        let is_use = nodes[i].is_ident(name) && is_variable_at(nodes, i);
        match &mut nodes[i] {
            Node::Group(group) => rename(&mut group.children, name, fresh),
            Node::Token(token) => {
                if is_use {
                    token.text = fresh.to_string();
                }
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        rename(&mut expr.nodes, name, fresh);
                    }
                }
            }
        }
    }
}

/// `let x;` in a loop body starts every iteration undefined; as a `var`
/// it would keep the previous iteration's value.
fn reset_each_iteration(nodes: &mut Vec<Node>) -> Result<()> {
    let mut bare = Vec::new();
    for i in 0..nodes.len() {
        if nodes[i].is_ident("let") && is_block_declaration(nodes, i) {
            for declarator in declarations(nodes, i).declarators {
                if declarator.init.is_none() && nodes[declarator.pattern].ident().is_some() {
                    bare.push(declarator.pattern);
                }
            }
        }
    }
    for pattern in bare.into_iter().rev() {
        let init = parse_nodes(" = void 0")?;
        nodes.splice(pattern + 1..pattern + 1, init);
    }
    Ok(())
}
