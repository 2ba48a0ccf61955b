//! Destructuring patterns to plain declarators.
//!
//! `const { a, b: [c] } = f()` becomes
//! `const _ref = f(), a = _ref.a, c = _ref.b[0]`. Patterns in parameter
//! lists and `for ... of`/`for ... in` heads are bound to a fresh name and
//! expanded at the top of the body.

use crate::js::syntax::{
    declarations, expression_end, is_reserved, split_commas, visit_mut, DeclarationList, Level,
};
use crate::js::{print_trimmed, Fragment, Node, Token, TokenKind};
use crate::transpile::passes::{
    is_identifier_name, is_parameter_list, prepend, splice, PassContext,
};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        lower_declarations(nodes, ctx)?;
        lower_loop_heads(nodes, ctx)?;
        lower_parameters(nodes, ctx)
    })
}

fn is_pattern(node: &Node) -> bool {
    node.is_group("{") || node.is_group("[")
}

fn is_declaration_keyword(nodes: &[Node], i: usize) -> bool {
    let node = &nodes[i];
    (node.is_ident("var") || node.is_ident("let") || node.is_ident("const"))
        && !(i > 0 && nodes[i - 1].is_punct("."))
}

// ========== Declarations ==========

fn lower_declarations(nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() {
        if is_declaration_keyword(nodes, i) {
            let list = declarations(nodes, i);
            let has_pattern = list.declarators.iter().any(|d| is_pattern(&nodes[d.pattern]));
            // Loop heads are expanded by the enclosing sequence.
            let loop_head = list.declarators.first().is_some_and(|d| {
                nodes
                    .get(d.pattern + 1)
                    .is_some_and(|n| n.is_ident("of") || n.is_ident("in"))
            });
            if has_pattern && !loop_head {
                let code = lower_declaration(nodes, i, &list, ctx)?;
                i += splice(nodes, i..list.end, &code)?;
                continue;
            }
        }
        i += 1;
    }
    Ok(())
}

fn lower_declaration(
    nodes: &[Node],
    keyword: usize,
    list: &DeclarationList,
    ctx: &mut PassContext,
) -> Result<String> {
    let mut out = Vec::new();
    for declarator in &list.declarators {
        let pattern = &nodes[declarator.pattern];
        let binding = print_trimmed(std::slice::from_ref(pattern));
        match (is_pattern(pattern), &declarator.init) {
            (true, Some(init)) => {
                let init = &nodes[init.clone()];
                let source = match init {
                    [node] if node.ident().is_some_and(|name| !is_reserved(name)) => {
                        print_trimmed(init)
                    }
                    _ => {
                        let name = ctx.fresh_name("_ref");
                        out.push(format!("{} = {}", name, print_trimmed(init)));
                        name
                    }
                };
                expand_pattern(pattern, &source, ctx, &mut out)?;
            }
            (true, None) => {
                return Err(Error::Unsupported(
                    "destructuring declaration without an initializer".to_string(),
                ))
            }
            (false, Some(init)) => {
                out.push(format!("{} = {}", binding, print_trimmed(&nodes[init.clone()])))
            }
            (false, None) => out.push(binding),
        }
    }

    let keyword = nodes[keyword].first_token().text.clone();
    let semicolon = if list.has_semicolon { ";" } else { "" };
    Ok(format!("{} {}{}", keyword, out.join(", "), semicolon))
}

// ========== Patterns ==========

/// Expand `pattern` read from `source` into `name = value` declarators.
fn expand_pattern(
    pattern: &Node,
    source: &str,
    ctx: &mut PassContext,
    out: &mut Vec<String>,
) -> Result<()> {
    let Node::Group(group) = pattern else {
        return bind(std::slice::from_ref(pattern), source.to_string(), ctx, out);
    };

    if group.open.text == "{" {
        for element in split_commas(&group.children) {
            let Some(first) = element.first() else {
                continue;
            };
            if first.is_punct("...") {
                return Err(Error::Unsupported(
                    "object rest in destructuring is not supported".to_string(),
                ));
            }
            let (key, target) = match element.iter().position(|n| n.is_punct(":")) {
                Some(colon) => (first, &element[colon + 1..]),
                None => (first, element),
            };
            bind(target, member(source, key)?, ctx, out)?;
        }
    } else {
        for (index, element) in split_commas(&group.children).into_iter().enumerate() {
            match element.first() {
                None => {}
                Some(first) if first.is_punct("...") => {
                    bind(&element[1..], format!("{}.slice({})", source, index), ctx, out)?;
                }
                Some(_) => bind(element, format!("{}[{}]", source, index), ctx, out)?,
            }
        }
    }
    Ok(())
}

/// Property access on `source` for an object pattern key.
fn member(source: &str, key: &Node) -> Result<String> {
    match key {
        Node::Group(group) if group.open.text == "[" => {
            Ok(format!("{}[{}]", source, print_trimmed(&group.children)))
        }
        Node::Token(token) => match token.kind {
            TokenKind::Ident => Ok(format!("{}.{}", source, token.text)),
            TokenKind::Str | TokenKind::Number => {
                Ok(format!("{}[{}]", source, token.text))
            }
            _ => Err(Error::Unsupported(format!(
                "unexpected `{}` in object pattern",
                token.text
            ))),
        },
        Node::Group(_) => Err(Error::Unsupported(
            "unexpected group in object pattern".to_string(),
        )),
    }
}

/// Bind a pattern element (`a`, `a = d`, `{ ... } = d`) to `value`.
fn bind(target: &[Node], value: String, ctx: &mut PassContext, out: &mut Vec<String>) -> Result<()> {
    let (binding, default) = match target.iter().position(|n| n.is_punct("=")) {
        Some(eq) => (&target[..eq], Some(&target[eq + 1..])),
        None => (target, None),
    };
    let [binding] = binding else {
        return Err(Error::Unsupported(format!(
            "unexpected binding `{}`",
            print_trimmed(binding)
        )));
    };

    let value = match default {
        Some(default) => {
            let checked = if is_identifier_name(&value) {
                value
            } else {
                let name = ctx.fresh_name("_ref");
                out.push(format!("{} = {}", name, value));
                name
            };
            format!(
                "{0} === undefined ? {1} : {0}",
                checked,
                print_trimmed(default)
            )
        }
        None => value,
    };

    if let Some(name) = binding.ident() {
        out.push(format!("{} = {}", name, value));
        return Ok(());
    }
    if !is_pattern(binding) {
        return Err(Error::Unsupported(format!(
            "unexpected binding `{}`",
            print_trimmed(std::slice::from_ref(binding))
        )));
    }

    let source = if default.is_some() {
        let name = ctx.fresh_name("_ref");
        out.push(format!("{} = {}", name, value));
        name
    } else {
        value
    };
    expand_pattern(binding, &source, ctx, out)
}

// ========== Loop heads and parameters ==========

/// `for (const [k, v] of xs) { ... }` binds a fresh name in the head.
fn lower_loop_heads(nodes: &mut [Node], ctx: &mut PassContext) -> Result<()> {
    for i in 0..nodes.len() {
        if !nodes[i].is_ident("for") {
            continue;
        }
        let Some(Node::Group(head)) = nodes.get(i + 1) else {
            continue;
        };
        let (keyword, pattern) = match head.children.as_slice() {
            [keyword, pattern, op, ..]
                if is_declaration_keyword(&head.children, 0)
                    && is_pattern(pattern)
                    && (op.is_ident("of") || op.is_ident("in")) =>
            {
                (keyword.first_token().text.clone(), pattern.clone())
            }
            _ => continue,
        };
        if !nodes.get(i + 2).is_some_and(|n| n.is_group("{")) {
            return Err(Error::Unsupported(
                "destructuring in a loop head needs a block body".to_string(),
            ));
        }

        let name = ctx.fresh_name("_ref");
        let mut decls = Vec::new();
        expand_pattern(&pattern, &name, ctx, &mut decls)?;

        if let Some(Node::Group(head)) = nodes.get_mut(i + 1) {
            head.children[1] = Node::Token(Token::ident(&name, " "));
        }
        prepend(&mut nodes[i + 2], &format!(" {} {};", keyword, decls.join(", ")))?;
    }
    Ok(())
}

fn lower_parameters(nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() {
        let is_arrow = nodes.get(i + 1).is_some_and(|n| n.is_punct("=>"));
        let has_body = nodes.get(i + 1).is_some_and(|n| n.is_group("{"));
        if !(nodes[i].is_group("(") && (is_arrow || has_body) && is_parameter_list(nodes, i)) {
            i += 1;
            continue;
        }
        let Some((params, decls)) = lower_parameter_list(&nodes[i], ctx)? else {
            i += 1;
            continue;
        };
        let decl_code = format!(" var {};", decls.join(", "));

        if is_arrow {
            let body = i + 2;
            if nodes.get(body).is_some_and(|n| n.is_group("{")) {
                prepend(&mut nodes[body], &decl_code)?;
            } else {
                let end = expression_end(nodes, body);
                if end == body {
                    return Err(Error::Unsupported("arrow function without a body".to_string()));
                }
                let expr = print_trimmed(&nodes[body..end]);
                splice(nodes, body..end, &format!("{{{} return {}; }}", decl_code, expr))?;
            }
        } else {
            prepend(&mut nodes[i + 1], &decl_code)?;
        }
        splice(nodes, i..i + 1, &params)?;
        i += 1;
    }
    Ok(())
}

/// The rewritten parameter list and the declarators its patterns expand to.
fn lower_parameter_list(
    params: &Node,
    ctx: &mut PassContext,
) -> Result<Option<(String, Vec<String>)>> {
    let Node::Group(group) = params else {
        return Ok(None);
    };
    let elements = split_commas(&group.children);
    if !elements.iter().any(|e| e.first().is_some_and(is_pattern)) {
        return Ok(None);
    }

    let mut names = Vec::new();
    let mut decls = Vec::new();
    for element in elements {
        if element.first().is_some_and(is_pattern) {
            let name = ctx.fresh_name("_ref");
            bind(element, name.clone(), ctx, &mut decls)?;
            names.push(name);
        } else {
            names.push(print_trimmed(element));
        }
    }
    Ok(Some((format!("({})", names.join(", ")), decls)))
}
