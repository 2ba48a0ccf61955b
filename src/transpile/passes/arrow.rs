//! Arrow functions to function expressions.
//!
//! Arrows that use `this` get `.bind(this)`. Arrows that use `arguments`
//! read it from a variable the enclosing function declares first:
//! `var _arguments = arguments;`.

use crate::js::syntax::{expression_end, visit_mut, Level};
use crate::js::{parse_nodes, print_trimmed, Fragment, Node, TokenKind};
use crate::transpile::passes::{is_function_body, splice, uses_this, PassContext};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    let mut captured = None;
    capture_arguments(&mut program.nodes, false, &mut captured, ctx)?;
    if captured.is_some() {
        return Err(Error::Unsupported(
            "`arguments` in an arrow function outside any function".to_string(),
        ));
    }
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| lower_arrows(nodes))
}

// ========== arguments ==========

/// Rename `arguments` inside arrow bodies of one function level to the
/// variable that captures the function's own `arguments`.
///
/// `captured` is set to that variable's name once one is needed; nested
/// function bodies get their own variable.
fn capture_arguments(
    nodes: &mut [Node],
    in_arrow: bool,
    captured: &mut Option<String>,
    ctx: &mut PassContext,
) -> Result<()> {
    let mut arrow_until = 0;
    for i in 0..nodes.len() {
        let in_arrow_here = in_arrow || i < arrow_until;
        if nodes[i].is_punct("=>") && !nodes.get(i + 1).is_some_and(|n| n.is_group("{")) {
            arrow_until = arrow_until.max(expression_end(nodes, i + 1));
        }
        let after_arrow = i > 0 && nodes[i - 1].is_punct("=>");
        let is_body = is_function_body(nodes, i) && !after_arrow;
        let is_member = i > 0 && (nodes[i - 1].is_punct(".") || nodes[i - 1].is_punct("?."));

        match &mut nodes[i] {
            Node::Group(group) if is_body => {
                let mut own = None;
                capture_arguments(&mut group.children, false, &mut own, ctx)?;
                if let Some(name) = own {
                    let mut declaration =
                        parse_nodes(&format!(" var {} = arguments;", name))?;
                    declaration.append(&mut group.children);
                    group.children = declaration;
                }
            }
            Node::Group(group) => {
                capture_arguments(&mut group.children, in_arrow_here || after_arrow, captured, ctx)?;
            }
            Node::Token(token) => match &mut token.kind {
                TokenKind::Ident if in_arrow_here && !is_member && token.text == "arguments" => {
                    let name = captured
                        .get_or_insert_with(|| ctx.fresh_name("_arguments"))
                        .clone();
                    token.text = name;
                }
                TokenKind::Template(template) => {
                    for expr in template.exprs.iter_mut() {
                        capture_arguments(&mut expr.nodes, in_arrow_here, captured, ctx)?;
                    }
                }
                _ => {}
            },
        }
    }
    Ok(())
}

// ========== Lowering ==========

/// Rewrite arrows right to left, so `a => b => c` lowers the inner arrow
/// before the outer one takes it as its body.
fn lower_arrows(nodes: &mut Vec<Node>) -> Result<()> {
    while let Some(arrow) = nodes.iter().rposition(|n| n.is_punct("=>")) {
        let (start, code) = lower_arrow(nodes, arrow)?;
        let end = body_end(nodes, arrow);
        splice(nodes, start..end, &code)?;
    }
    Ok(())
}

fn body_end(nodes: &[Node], arrow: usize) -> usize {
    if nodes.get(arrow + 1).is_some_and(|n| n.is_group("{")) {
        arrow + 2
    } else {
        expression_end(nodes, arrow + 1)
    }
}

/// Start index and replacement code for the arrow at `arrow`.
fn lower_arrow(nodes: &[Node], arrow: usize) -> Result<(usize, String)> {
    let params_index = arrow.checked_sub(1).ok_or_else(|| unsupported(nodes, arrow))?;
    let params_node = &nodes[params_index];
    let params = if params_node.is_group("(") {
        print_trimmed(std::slice::from_ref(params_node))
    } else if let Some(name) = params_node.ident() {
        format!("({})", name)
    } else {
        return Err(unsupported(nodes, arrow));
    };

    let is_async = params_index > 0 && nodes[params_index - 1].is_ident("async");
    let start = if is_async { params_index - 1 } else { params_index };

    let end = body_end(nodes, arrow);
    let body_nodes = &nodes[arrow + 1..end];
    if body_nodes.is_empty() {
        return Err(unsupported(nodes, arrow));
    }
    let body = if body_nodes.len() == 1 && body_nodes[0].is_group("{") {
        print_trimmed(body_nodes)
    } else {
        format!("{{ return {}; }}", print_trimmed(body_nodes))
    };

    let keyword = if is_async { "async function" } else { "function" };
    let mut code = format!("{} {} {}", keyword, params, body);
    if uses_this(&nodes[params_index..end]) {
        code.push_str(".bind(this)");
    }
    Ok((start, code))
}

fn unsupported(nodes: &[Node], arrow: usize) -> Error {
    let (line, col) = nodes[arrow].position();
    Error::Unsupported(format!("malformed arrow function at {}:{}", line, col))
}
