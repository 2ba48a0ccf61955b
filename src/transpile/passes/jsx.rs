//! JSX elements to pragma calls.

use crate::js::syntax::{visit_mut, Level};
use crate::js::{
    print_trimmed, Fragment, JsxAttr, JsxAttrValue, JsxChild, JsxElement, Node, TokenKind,
};
use crate::transpile::passes::{is_identifier_name, quote, splice, PassContext};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    let pragma = ctx.pragma.clone();
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        compile_in(nodes, &pragma)
    })
}

fn compile_in(nodes: &mut Vec<Node>, pragma: &str) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() {
        let code = match &nodes[i] {
            Node::Token(token) => match &token.kind {
                TokenKind::Jsx(element) => Some(compile_element(element, pragma)?),
                _ => None,
            },
            Node::Group(_) => None,
        };
        i += match code {
            Some(code) => splice(nodes, i..i + 1, &code)?,
            None => 1,
        };
    }
    Ok(())
}

fn compile_element(element: &JsxElement, pragma: &str) -> Result<String> {
    let tag = match &element.name {
        Some(name) => tag_expr(name),
        None => fragment_tag(pragma),
    };
    let mut args = vec![tag, compile_props(&element.attrs, pragma)?];

    for child in &element.children {
        match child {
            JsxChild::Text(text) => {
                let text = clean_text(text);
                if !text.is_empty() {
                    args.push(quote(&decode_entities(&text)));
                }
            }
            JsxChild::Expr(fragment) if fragment.is_empty() => {}
            JsxChild::Expr(fragment) => args.push(compile_fragment(fragment, pragma)?),
            JsxChild::Element(child) => args.push(compile_element(child, pragma)?),
        }
    }

    Ok(format!("{}({})", pragma, args.join(", ")))
}

/// Compile the JSX nested in an expression container and print it.
fn compile_fragment(fragment: &Fragment, pragma: &str) -> Result<String> {
    let mut nodes = fragment.nodes.clone();
    visit_mut(&mut nodes, Level::Embedded, &mut |nodes, _| {
        compile_in(nodes, pragma)
    })?;
    Ok(print_trimmed(&nodes))
}

/// Intrinsic elements become strings; components and member tags stay
/// expressions.
fn tag_expr(name: &str) -> String {
    if name.contains('.') {
        return name.to_string();
    }
    let intrinsic = name.starts_with(|c: char| c.is_lowercase()) || name.contains(['-', ':']);
    if intrinsic {
        quote(name)
    } else {
        name.to_string()
    }
}

fn fragment_tag(pragma: &str) -> String {
    match pragma.rsplit_once('.') {
        Some((object, _)) => format!("{}.Fragment", object),
        None => "React.Fragment".to_string(),
    }
}

fn compile_props(attrs: &[JsxAttr], pragma: &str) -> Result<String> {
    let mut groups: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut has_spread = false;

    for attr in attrs {
        match attr {
            JsxAttr::Named { name, value } => {
                let key = if is_identifier_name(name) {
                    name.clone()
                } else {
                    quote(name)
                };
                let value = match value {
                    None => "true".to_string(),
                    Some(JsxAttrValue::Str(text)) => quote(&decode_entities(text)),
                    Some(JsxAttrValue::Expr(fragment)) if fragment.is_empty() => {
                        return Err(Error::Unsupported(format!(
                            "JSX attribute `{}` must be assigned a non-empty expression",
                            name
                        )));
                    }
                    Some(JsxAttrValue::Expr(fragment)) => compile_fragment(fragment, pragma)?,
                    Some(JsxAttrValue::Element(element)) => compile_element(element, pragma)?,
                };
                current.push(format!("{}: {}", key, value));
            }
            JsxAttr::Spread(fragment) => {
                if !current.is_empty() {
                    groups.push(object_literal(&current));
                    current.clear();
                }
                groups.push(compile_fragment(fragment, pragma)?);
                has_spread = true;
            }
        }
    }
    if !current.is_empty() {
        groups.push(object_literal(&current));
    }

    Ok(match groups.len() {
        0 => "null".to_string(),
        1 if !has_spread => groups.remove(0),
        _ => format!("Object.assign({{}}, {})", groups.join(", ")),
    })
}

fn object_literal(props: &[String]) -> String {
    format!("{{ {} }}", props.join(", "))
}

/// Apply the JSX whitespace rules to a text child.
///
/// Lines are trimmed (except the outer edges of the first and last line),
/// whitespace-only lines are dropped and the rest are joined with a space.
fn clean_text(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(&trimmed);
        if i != last_non_empty {
            out.push(' ');
        }
    }
    out
}

/// Decode the HTML entities JSX text and attribute strings may contain.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some('\u{a0}'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "copy" => Some('\u{a9}'),
        "hellip" => Some('\u{2026}'),
        "mdash" => Some('\u{2014}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse, print};

    fn compile_with(source: &str, pragma: &str) -> String {
        let mut program = parse(source).unwrap();
        let mut ctx = PassContext::new(pragma, &program);
        run(&mut program, &mut ctx).unwrap();
        print(&program)
    }

    fn compile(source: &str) -> String {
        compile_with(source, "React.createElement")
    }

    #[test]
    fn test_component_with_string_attribute() {
        assert_eq!(
            compile("render(<App message=\"hi\" />, root);\n"),
            "render(React.createElement(App, { message: 'hi' }), root);\n"
        );
    }

    #[test]
    fn test_intrinsic_with_spread_and_children() {
        assert_eq!(
            compile("const el = <div className=\"cat\" {...props} key={id}>Hello {name}!</div>;"),
            "const el = React.createElement('div', Object.assign({}, { className: 'cat' }, props, { key: id }), 'Hello ', name, '!');"
        );
    }

    #[test]
    fn test_multiline_text_is_collapsed() {
        assert_eq!(
            compile("x = <p>\n  line one\n  line two\n</p>;"),
            "x = React.createElement('p', null, 'line one line two');"
        );
    }

    #[test]
    fn test_fragment_and_nested_elements() {
        assert_eq!(
            compile("x = <>{a}<b.Item flag data-id=\"1\" /></>;"),
            "x = React.createElement(React.Fragment, null, a, React.createElement(b.Item, { flag: true, 'data-id': '1' }));"
        );
    }

    #[test]
    fn test_jsx_inside_expression_container() {
        assert_eq!(
            compile("x = <ul>{items.map(i => <li key={i}>{i}</li>)}</ul>;"),
            "x = React.createElement('ul', null, items.map(i => React.createElement('li', { key: i }, i)));"
        );
    }

    #[test]
    fn test_custom_pragma_and_comment_child() {
        assert_eq!(
            compile_with("x = <div>{/* note */}</div>;", "h"),
            "x = h('div', null);"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            compile("x = <p>a &amp; b&nbsp;&#33; &bogus;</p>;"),
            "x = React.createElement('p', null, 'a & b\\xA0! &bogus;');"
        );
    }

    #[test]
    fn test_empty_attribute_expression_fails() {
        let mut program = parse("x = <a b={} />;").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        assert!(matches!(
            run(&mut program, &mut ctx),
            Err(Error::Unsupported(_))
        ));
    }
}
