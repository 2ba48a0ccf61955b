//! Computed property keys in object literals.
//!
//! Properties up to the first computed key stay in the literal; that key
//! and every later property are added with `_defineProperty` in source
//! order:
//!
//! `{ a: 1, [k]: v, b: 2 }` becomes
//! `_defineProperty(_defineProperty({ a: 1 }, k, v), 'b', 2)`.

use crate::js::syntax::split_commas;
use crate::js::{print_trimmed, Fragment, Node, TokenKind};
use crate::transpile::passes::shorthand::visit_objects;
use crate::transpile::passes::{quote, splice, Helper, PassContext};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    visit_objects(&mut program.nodes, &mut |nodes, i| {
        let Some(code) = lower_object(&nodes[i])? else {
            return Ok(());
        };
        ctx.use_helper(Helper::DefineProperty);
        splice(nodes, i..i + 1, &code)?;
        Ok(())
    })
}

fn is_computed(element: &[Node]) -> bool {
    element.first().is_some_and(|n| n.is_group("["))
        && element.get(1).is_some_and(|n| n.is_punct(":"))
}

/// The `_defineProperty` chain for an object with a computed key.
fn lower_object(object: &Node) -> Result<Option<String>> {
    let Node::Group(group) = object else {
        return Ok(None);
    };
    let elements = split_commas(&group.children);
    let Some(first) = elements.iter().position(|e| is_computed(e)) else {
        return Ok(None);
    };

    let head: Vec<String> = elements[..first].iter().map(|e| print_trimmed(e)).collect();
    let mut code = if head.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", head.join(", "))
    };
    for element in &elements[first..] {
        let (key, value) = property(element)?;
        code = format!("_defineProperty({}, {}, {})", code, key, value);
    }
    Ok(Some(code))
}

/// Key expression and value of a `key: value` property.
fn property(element: &[Node]) -> Result<(String, String)> {
    let unsupported = || {
        let (line, col) = element.first().map(Node::position).unwrap_or_default();
        Error::Unsupported(format!(
            "property `{}` at {}:{} after a computed key",
            print_trimmed(element),
            line,
            col
        ))
    };
    let [key, colon, value @ ..] = element else {
        return Err(unsupported());
    };
    if !colon.is_punct(":") || value.is_empty() {
        return Err(unsupported());
    }
    let key = match key {
        Node::Group(group) if group.open.text == "[" => print_trimmed(&group.children),
        Node::Token(token) => match token.kind {
            TokenKind::Ident => quote(&token.text),
            TokenKind::Str | TokenKind::Number => token.text.clone(),
            _ => return Err(unsupported()),
        },
        Node::Group(_) => return Err(unsupported()),
    };
    Ok((key, print_trimmed(value)))
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
    fn test_computed_keys() {
        assert_eq!(
            lower("var o = { a: 1, [k]: v, b: 2, 'c': 3 };").unwrap(),
            "var o = _defineProperty(_defineProperty(_defineProperty({ a: 1 }, k, v), 'b', 2), 'c', 3);"
        );
        assert_eq!(
            lower("f({ [`${p}x`]: g() });").unwrap(),
            "f(_defineProperty({}, `${p}x`, g()));"
        );
    }

    #[test]
    fn test_nested_object_lowered_first() {
        assert_eq!(
            lower("var o = { x: { [k]: 1 } };").unwrap(),
            "var o = { x: _defineProperty({}, k, 1) };"
        );
    }

    #[test]
    fn test_patterns_and_plain_objects_untouched() {
        let source = "var { [k]: v } = o;\nvar p = { a: [1], b: 2 };\n";
        assert_eq!(lower(source).unwrap(), source);
    }

    #[test]
    fn test_accessor_after_computed_key_fails() {
        assert!(matches!(
            lower("var o = { [k]: 1, get x() { return 2; } };"),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_helper_is_requested() {
        let mut program = parse("var o = { [k]: 1 };").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        run(&mut program, &mut ctx).unwrap();
        assert_eq!(ctx.helpers().collect::<Vec<_>>(), vec![Helper::DefineProperty]);
    }
}
