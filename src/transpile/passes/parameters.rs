//! Default and rest parameters.
//!
//! Parameters from the first default (or rest) onwards are read from
//! `arguments` at the top of the body, so the function's `length` is
//! unchanged:
//!
//! `function f(a, b = 1, ...rest) {}` becomes
//! `function f(a) { var b = arguments.length > 1 && arguments[1] !== undefined ? arguments[1] : 1, rest = Array.prototype.slice.call(arguments, 2); }`

use crate::js::syntax::{split_commas, visit_mut, Level};
use crate::js::{print_trimmed, Fragment, Node};
use crate::transpile::passes::{is_parameter_list, prepend, splice};
use crate::{Error, Result};

pub fn run(program: &mut Fragment) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        for i in 0..nodes.len() {
            if !(nodes[i].is_group("(") && is_parameter_list(nodes, i)) {
                continue;
            }
            let is_catch = i > 0 && nodes[i - 1].is_ident("catch");
            let has_body = nodes.get(i + 1).is_some_and(|n| n.is_group("{"));
            let Some((params, decls)) = lower_parameter_list(&nodes[i])? else {
                continue;
            };
            if is_catch || !has_body {
                let (line, col) = nodes[i].position();
                return Err(Error::Unsupported(format!(
                    "default or rest parameter at {}:{} outside a function body",
                    line, col
                )));
            }
            prepend(&mut nodes[i + 1], &format!(" var {};", decls.join(", ")))?;
            splice(nodes, i..i + 1, &params)?;
        }
        Ok(())
    })
}

/// The shortened parameter list and the declarators that read the rest
/// from `arguments`; `None` when no parameter has a default or rest.
fn lower_parameter_list(params: &Node) -> Result<Option<(String, Vec<String>)>> {
    let Node::Group(group) = params else {
        return Ok(None);
    };
    let elements = split_commas(&group.children);
    let is_special = |element: &[Node]| {
        element.first().is_some_and(|n| n.is_punct("..."))
            || element.iter().any(|n| n.is_punct("="))
    };
    let Some(first) = elements.iter().position(|e| is_special(*e)) else {
        return Ok(None);
    };

    let kept: Vec<String> = elements[..first].iter().map(|e| print_trimmed(e)).collect();
    let mut decls = Vec::new();
    for (index, element) in elements.iter().enumerate().skip(first) {
        if element.first().is_some_and(|n| n.is_punct("...")) {
            if index + 1 != elements.len() {
                return Err(Error::Unsupported(
                    "rest parameter must be last".to_string(),
                ));
            }
            decls.push(format!(
                "{} = Array.prototype.slice.call(arguments, {})",
                print_trimmed(&element[1..]),
                index
            ));
            continue;
        }
        match element.iter().position(|n| n.is_punct("=")) {
            Some(eq) => decls.push(format!(
                "{0} = arguments.length > {1} && arguments[{1}] !== undefined ? arguments[{1}] : {2}",
                print_trimmed(&element[..eq]),
                index,
                print_trimmed(&element[eq + 1..])
            )),
            None => decls.push(format!("{} = arguments[{}]", print_trimmed(element), index)),
        }
    }
    Ok(Some((format!("({})", kept.join(", ")), decls)))
}
