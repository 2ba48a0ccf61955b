//! Spread elements in calls, `new` expressions and array literals.
//!
//! - `f(a, ...b)` becomes `f.apply(undefined, [a].concat(_toConsumableArray(b)))`;
//! - `o.m(...b)` keeps `o` as the receiver: `o.m.apply(o, ...)`;
//! - `new F(...b)` becomes
//!   `new (Function.prototype.bind.apply(F, [null].concat(...)))()`;
//! - `[a, ...b]` becomes `[a].concat(_toConsumableArray(b))`.
//!
//! A method receiver is evaluated twice, so it must be a plain member
//! chain (`this.items`, `a.b[0]`); anything else fails the file.

use crate::js::syntax::{is_reserved, split_commas, visit_mut, Level};
use crate::js::{print_trimmed, Fragment, Node, TokenKind};
use crate::transpile::passes::{is_parameter_list, splice, Helper, PassContext};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        let mut i = 0;
        while i < nodes.len() {
            i = match lower_at(nodes, i, ctx)? {
                Some(next) => next,
                None => i + 1,
            };
        }
        Ok(())
    })
}

fn has_spread(node: &Node) -> bool {
    node.group()
        .is_some_and(|g| split_commas(&g.children).iter().any(|e| is_spread(e)))
}

fn is_spread(element: &[Node]) -> bool {
    element.first().is_some_and(|n| n.is_punct("..."))
}

/// Whether `node` can end the operand a call or index applies to.
fn ends_operand(node: &Node) -> bool {
    match node {
        Node::Group(group) => group.open.text != "{",
        Node::Token(token) => match token.kind {
            TokenKind::Ident => !is_reserved(&token.text) || token.text == "this" || token.text == "super",
            TokenKind::Str | TokenKind::Template(_) => true,
            _ => false,
        },
    }
}

/// Lower the spread at `i`, if any; returns the index to continue from.
fn lower_at(nodes: &mut Vec<Node>, i: usize, ctx: &mut PassContext) -> Result<Option<usize>> {
    if !has_spread(&nodes[i]) {
        return Ok(None);
    }
    let is_call = nodes[i].is_group("(")
        && i > 0
        && ends_operand(&nodes[i - 1])
        && !is_parameter_list(nodes, i);
    if is_call {
        return lower_call(nodes, i, ctx).map(Some);
    }

    let is_pattern = nodes.get(i + 1).is_some_and(|n| n.is_punct("="));
    let is_index = i > 0 && ends_operand(&nodes[i - 1]);
    if nodes[i].is_group("[") && !is_pattern && !is_index {
        let code = concatenation(&nodes[i], ctx)?;
        splice(nodes, i..i + 1, &code)?;
        return Ok(Some(i + 1));
    }
    Ok(None)
}

/// One array expression holding every element of `group`, spreads
/// expanded.
fn concatenation(group: &Node, ctx: &mut PassContext) -> Result<String> {
    let Node::Group(group) = group else {
        return Ok(String::new());
    };
    let mut chunks = Vec::new();
    let mut pending = Vec::new();
    for element in split_commas(&group.children) {
        if element.is_empty() {
            let (line, col) = (group.open.line, group.open.col);
            return Err(Error::Unsupported(format!(
                "array hole next to a spread at {}:{}",
                line, col
            )));
        }
        if is_spread(element) {
            if !pending.is_empty() {
                chunks.push(format!("[{}]", pending.join(", ")));
                pending.clear();
            }
            ctx.use_helper(Helper::ToConsumableArray);
            chunks.push(format!("_toConsumableArray({})", print_trimmed(&element[1..])));
        } else {
            pending.push(print_trimmed(element));
        }
    }
    if !pending.is_empty() {
        chunks.push(format!("[{}]", pending.join(", ")));
    }
    Ok(match chunks.split_first() {
        Some((first, [])) => first.clone(),
        Some((first, rest)) => format!("{}.concat({})", first, rest.join(", ")),
        None => "[]".to_string(),
    })
}

/// Index of the first node of the callee ending just before `call`.
fn callee_start(nodes: &[Node], call: usize) -> usize {
    let mut start = call - 1;
    loop {
        let node = &nodes[start];
        if start >= 1
            && (node.is_group("[") || node.is_group("("))
            && ends_operand(&nodes[start - 1])
        {
            start -= 1;
        } else if start >= 2 && (nodes[start - 1].is_punct(".") || nodes[start - 1].is_punct("?.")) {
            start -= 2;
        } else {
            return start;
        }
    }
}

/// Whether evaluating `nodes` twice is the same as evaluating them once.
fn is_plain_chain(nodes: &[Node]) -> bool {
    nodes.iter().all(|node| match node {
        Node::Token(token) => token.kind == TokenKind::Ident || token.is_punct("."),
        Node::Group(group) => {
            group.open.text == "["
                && matches!(group.children.as_slice(), [Node::Token(token)] if matches!(
                    token.kind,
                    TokenKind::Ident | TokenKind::Str | TokenKind::Number
                ))
        }
    })
}

fn lower_call(nodes: &mut Vec<Node>, i: usize, ctx: &mut PassContext) -> Result<usize> {
    let start = callee_start(nodes, i);
    let args = concatenation(&nodes[i], ctx)?;
    let callee = &nodes[start..i];
    let (line, col) = callee[0].position();

    if start >= 1 && nodes[start - 1].is_ident("new") {
        let code = format!(
            "new (Function.prototype.bind.apply({}, [null].concat({})))()",
            print_trimmed(callee),
            args
        );
        splice(nodes, start - 1..i + 1, &code)?;
        return Ok(start);
    }

    let receiver = match callee {
        [_] => "undefined".to_string(),
        [object @ .., dot, _name] if dot.is_punct(".") => {
            if !is_plain_chain(object) {
                return Err(Error::Unsupported(format!(
                    "spread call at {}:{} needs a plain receiver",
                    line, col
                )));
            }
            print_trimmed(object)
        }
        _ => {
            return Err(Error::Unsupported(format!(
                "spread call at {}:{} on a computed callee",
                line, col
            )))
        }
    };
    let code = format!("{}.apply({}, {})", print_trimmed(callee), receiver, args);
    splice(nodes, start..i + 1, &code)?;
    Ok(start + 1)
}
