//! `for ... of` loops to iterator protocol loops.
//!
//! `for (const x of xs) { body }` becomes
//!
//! ```text
//! for (var _iterator = xs[Symbol.iterator](), _step; !(_step = _iterator.next()).done;) { const x = _step.value; body }
//! ```
//!
//! The iterator's `return()` is not called when the loop exits early.

use crate::js::syntax::{is_reserved, statement_end, visit_mut, Level};
use crate::js::{print_trimmed, Fragment, Node};
use crate::transpile::passes::{prepend, splice, PassContext};
use crate::{Error, Result};

/// Keywords that may start a loop body written without braces.
const SIMPLE_STATEMENTS: &[&str] = &[
    "this", "new", "typeof", "void", "delete", "return", "throw", "break", "continue", "super",
    "null", "true", "false", "await", "yield",
];

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        let mut i = 0;
        while i < nodes.len() {
            if nodes[i].is_ident("for") && !(i > 0 && nodes[i - 1].is_punct(".")) {
                lower_loop(nodes, i, ctx)?;
            }
            i += 1;
        }
        Ok(())
    })
}

/// The parts of a `for ... of` head.
struct Head {
    /// `var`/`let`/`const`, if the head declares its target.
    keyword: Option<String>,
    target: String,
    iterable: String,
}

fn parse_head(head: &Node) -> Option<Head> {
    let group = head.group().filter(|g| g.open.text == "(")?;
    let children = &group.children;
    if children.iter().any(|n| n.is_punct(";")) {
        return None;
    }
    let of = (1..children.len())
        .find(|&i| children[i].is_ident("of") && !children[i - 1].is_punct("."))?;
    let declares = of == 2
        && ["var", "let", "const"]
            .iter()
            .any(|keyword| children[0].is_ident(keyword));
    let (keyword, target) = if declares {
        (Some(children[0].first_token().text.clone()), &children[1..of])
    } else {
        (None, &children[..of])
    };
    let iterable = &children[of + 1..];
    let iterable = match iterable {
        [single] => print_trimmed(std::slice::from_ref(single)),
        _ => format!("({})", print_trimmed(iterable)),
    };
    Some(Head {
        keyword,
        target: print_trimmed(target),
        iterable,
    })
}

fn lower_loop(nodes: &mut Vec<Node>, i: usize, ctx: &mut PassContext) -> Result<()> {
    let (line, col) = nodes[i].position();
    if nodes.get(i + 1).is_some_and(|n| n.is_ident("await")) {
        return Err(Error::Unsupported(format!("`for await` at {}:{}", line, col)));
    }
    let Some(head) = nodes.get(i + 1).and_then(parse_head) else {
        return Ok(());
    };
    let body = i + 2;
    if body >= nodes.len() {
        return Ok(());
    }

    let iterator = ctx.fresh_name("_iterator");
    let step = ctx.fresh_name("_step");
    let binding = match &head.keyword {
        Some(keyword) => format!(" {} {} = {}.value;", keyword, head.target, step),
        None if head.target.starts_with('{') => format!(" ({} = {}.value);", head.target, step),
        None => format!(" {} = {}.value;", head.target, step),
    };

    if nodes[body].is_group("{") {
        prepend(&mut nodes[body], &binding)?;
    } else {
        let simple = match nodes[body].ident() {
            Some(word) => !is_reserved(word) || SIMPLE_STATEMENTS.contains(&word),
            None => true,
        };
        if !simple {
            return Err(Error::Unsupported(format!(
                "`for ... of` at {}:{} needs a block body",
                line, col
            )));
        }
        let end = statement_end(nodes, body);
        let statement = print_trimmed(&nodes[body..end]);
        splice(nodes, body..end, &format!("{{{} {} }}", binding, statement))?;
    }

    splice(
        nodes,
        i + 1..i + 2,
        &format!(
            "(var {iterator} = {}[Symbol.iterator](), {step}; !({step} = {iterator}.next()).done;)",
            head.iterable
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse, print};

    fn lower(source: &str) -> Result<String> {
        let mut program = parse(source)?;
        let mut ctx = PassContext::new("React.createElement", &program);
        run(&mut program, &mut ctx)?;
        Ok(print(&program))
    }

    #[test]
    fn test_declared_target() {
        assert_eq!(
            lower("for (const x of xs) { use(x); }").unwrap(),
            "for (var _iterator = xs[Symbol.iterator](), _step; !(_step = _iterator.next()).done;) { const x = _step.value; use(x); }"
        );
    }

    #[test]
    fn test_bare_target_and_complex_iterable() {
        assert_eq!(
            lower("for (o.last of a.concat(b)) log(o.last);").unwrap(),
            "for (var _iterator = (a.concat(b))[Symbol.iterator](), _step; !(_step = _iterator.next()).done;) { o.last = _step.value; log(o.last); }"
        );
    }

    #[test]
    fn test_nested_loops_get_fresh_names() {
        // Inner loops are lowered first.
        let out = lower("for (let row of rows) { for (let cell of row) { f(cell); } }").unwrap();
        assert!(out.contains("var _iterator = row[Symbol.iterator](), _step;"));
        assert!(out.contains("var _iterator2 = rows[Symbol.iterator](), _step2;"));
    }

    #[test]
    fn test_for_in_and_counting_loops_untouched() {
        let source = "for (const k in o) {}\nfor (let i = 0; i < n; i++) {}\n";
        assert_eq!(lower(source).unwrap(), source);
    }

    #[test]
    fn test_unsupported_forms() {
        assert!(matches!(
            lower("async function f() { for await (const x of xs) {} }"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            lower("for (const x of xs) if (x) f(x);"),
            Err(Error::Unsupported(_))
        ));
    }
}
