//! Source printer for token trees.

use crate::js::token::{Fragment, Node, Template, Token, TokenKind};

/// Print a fragment, including its trailing trivia.
pub fn print(fragment: &Fragment) -> String {
    let mut out = String::new();
    write_fragment(&mut out, fragment);
    out
}

/// Print a node sequence.
pub fn print_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Print a node sequence without the whitespace before its first token.
pub fn print_trimmed(nodes: &[Node]) -> String {
    print_nodes(nodes).trim_start().to_string()
}

fn write_fragment(out: &mut String, fragment: &Fragment) {
    for node in &fragment.nodes {
        write_node(out, node);
    }
    out.push_str(&fragment.trailing);
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Token(token) => write_token(out, token),
        Node::Group(group) => {
            write_token(out, &group.open);
            for child in &group.children {
                write_node(out, child);
            }
            write_token(out, &group.close);
        }
    }
}

fn write_token(out: &mut String, token: &Token) {
    out.push_str(&token.leading);
    match &token.kind {
        TokenKind::Template(template) => write_template(out, template),
        _ => out.push_str(&token.text),
    }
}

fn write_template(out: &mut String, template: &Template) {
    out.push('`');
    for (i, quasi) in template.quasis.iter().enumerate() {
        out.push_str(quasi);
        if let Some(expr) = template.exprs.get(i) {
            out.push_str("${");
            write_fragment(out, expr);
            out.push('}');
        }
    }
    out.push('`');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::parse;

    fn roundtrip(source: &str) {
        let fragment = parse(source).unwrap();
        assert_eq!(print(&fragment), source);
    }

    #[test]
    fn test_roundtrip_preserves_bytes() {
        roundtrip("");
        roundtrip("  // only a comment\n");
        roundtrip("const a = { b: [1, 2], c: (d) => d * 2 }; /* done */\n");
        roundtrip("const s = `x ${ y + `z${w}` } v`;\n");
        roundtrip("render(<App message={msg} {...rest}>\n  text &nbsp; {/* c */}\n</App>);\n");
        roundtrip("if (a) {\n\treturn /re[/]/g.test(b);\n}\n");
    }

    #[test]
    fn test_print_trimmed() {
        let fragment = parse("   a + b").unwrap();
        assert_eq!(print_trimmed(&fragment.nodes), "a + b");
    }
}
