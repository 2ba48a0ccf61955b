//! Classes to constructor functions.
//!
//! ```text
//! class Cat extends Animal { constructor(n) { super(n); } meow() {} }
//! ```
//!
//! becomes
//!
//! ```text
//! let Cat = function (_Animal) {
//!   _inherits(Cat, _Animal);
//!
//!   function Cat(n) { _classCallCheck(this, Cat); _Animal.call(this, n); }
//!
//!   _createClass(Cat, [{ key: 'meow', value: function () {} }]);
//!
//!   return Cat;
//! }(Animal);
//! ```
//!
//! Inner classes are lowered first. `super(...)`, `super.m` and
//! `super.m(...)` become calls on the superclass. Class fields and
//! generator methods are not supported.

use std::ops::Range;

use crate::js::syntax::{is_asi_boundary, visit_mut, Level};
use crate::js::{parse_nodes, print_trimmed, Fragment, Node, TokenKind};
use crate::transpile::passes::{quote, splice, Helper, PassContext};
use crate::{Error, Result};

pub fn run(program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, level| {
        let mut i = 0;
        while i < nodes.len() {
            if is_class_keyword(nodes, i) {
                let (range, code) = lower_class(nodes, i, level, ctx)?;
                splice(nodes, range, &code)?;
            }
            i += 1;
        }
        Ok(())
    })
}

fn is_class_keyword(nodes: &[Node], i: usize) -> bool {
    let is_member = i > 0 && (nodes[i - 1].is_punct(".") || nodes[i - 1].is_punct("?."));
    let is_key = nodes
        .get(i + 1)
        .is_some_and(|n| n.is_punct(":") || n.is_group("("));
    nodes[i].is_ident("class") && !is_member && !is_key
}

/// Whether the class at `i` is a declaration rather than an expression.
fn is_declaration(nodes: &[Node], i: usize, level: Level) -> bool {
    if !matches!(level, Level::Program | Level::Brace) {
        return false;
    }
    match i.checked_sub(1).map(|p| &nodes[p]) {
        None => true,
        Some(prev) => {
            prev.is_punct(";")
                || prev.is_group("{")
                || prev.is_ident("export")
                || is_asi_boundary(prev, &nodes[i])
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Method,
    Async,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Constructor,
    Prototype,
    Static,
}

#[derive(Debug)]
struct Member {
    is_static: bool,
    kind: Kind,
    key: String,
    params: Node,
    body: Node,
}

fn unsupported(node: &Node, what: &str) -> Error {
    let (line, col) = node.position();
    Error::Unsupported(format!("{} at {}:{}", what, line, col))
}

/// The methods of a class body and its constructor, if any.
fn parse_members(children: &[Node]) -> Result<(Vec<Member>, Option<Member>)> {
    let mut members = Vec::new();
    let mut constructor = None;
    let mut i = 0;
    while i < children.len() {
        if children[i].is_punct(";") {
            i += 1;
            continue;
        }
        let start = &children[i];
        let is_static = children[i].is_ident("static")
            && !children.get(i + 1).is_some_and(|n| n.is_group("("));
        if is_static {
            i += 1;
        }
        let modifier = children.get(i).and_then(Node::ident).filter(|word| {
            matches!(*word, "get" | "set" | "async")
                && children
                    .get(i + 1)
                    .is_some_and(|n| !n.is_group("(") && !n.is_punct("=") && !n.is_punct(";"))
        });
        let kind = match modifier {
            Some("get") => Kind::Get,
            Some("set") => Kind::Set,
            Some(_) => Kind::Async,
            None => Kind::Method,
        };
        if modifier.is_some() {
            i += 1;
        }
        if children.get(i).is_some_and(|n| n.is_punct("*")) {
            return Err(unsupported(start, "generator method"));
        }

        let (Some(key), Some(params), Some(body)) =
            (children.get(i), children.get(i + 1), children.get(i + 2))
        else {
            return Err(unsupported(start, "class field"));
        };
        if !params.is_group("(") || !body.is_group("{") {
            return Err(unsupported(start, "class field"));
        }
        let key_code = match key {
            Node::Group(group) if group.open.text == "[" => print_trimmed(&group.children),
            Node::Token(token) => match token.kind {
                TokenKind::Ident => quote(&token.text),
                TokenKind::Str | TokenKind::Number => token.text.clone(),
                _ => return Err(unsupported(key, "class member")),
            },
            Node::Group(_) => return Err(unsupported(key, "class member")),
        };
        let member = Member {
            is_static,
            kind,
            key: key_code,
            params: params.clone(),
            body: body.clone(),
        };
        if key.is_ident("constructor") && !is_static && kind == Kind::Method {
            constructor = Some(member);
        } else {
            members.push(member);
        }
        i += 3;
    }
    Ok((members, constructor))
}

/// Rewrite `super` inside a method body.
fn replace_super(body: &mut Node, superclass: Option<&str>, place: Place) -> Result<()> {
    let Node::Group(group) = body else {
        return Ok(());
    };
    visit_mut(&mut group.children, Level::Brace, &mut |nodes, _| {
        let mut i = 0;
        while i < nodes.len() {
            if !nodes[i].is_ident("super") || (i > 0 && nodes[i - 1].is_punct(".")) {
                i += 1;
                continue;
            }
            let Some(superclass) = superclass else {
                return Err(unsupported(&nodes[i], "`super` in a class without `extends`"));
            };
            let call_args = |node: Option<&Node>| {
                node.and_then(Node::group)
                    .filter(|g| g.open.text == "(")
                    .map(|g| match print_trimmed(&g.children) {
                        args if args.is_empty() => String::new(),
                        args => format!(", {}", args),
                    })
            };

            if let Some(args) = call_args(nodes.get(i + 1)) {
                if place != Place::Constructor {
                    return Err(unsupported(&nodes[i], "`super()` outside a constructor"));
                }
                let code = format!("{}.call(this{})", superclass, args);
                i += splice(nodes, i..i + 2, &code)?;
                continue;
            }

            let member_end = if nodes.get(i + 1).is_some_and(|n| n.is_punct("."))
                && nodes.get(i + 2).and_then(Node::ident).is_some()
            {
                i + 3
            } else if nodes.get(i + 1).is_some_and(|n| n.is_group("[")) {
                i + 2
            } else {
                return Err(unsupported(&nodes[i], "bare `super`"));
            };
            let target = match place {
                Place::Static => superclass.to_string(),
                _ => format!("{}.prototype", superclass),
            };
            let member = print_trimmed(&nodes[i + 1..member_end]);
            let (code, end) = match call_args(nodes.get(member_end)) {
                Some(args) => (
                    format!("{}{}.call(this{})", target, member, args),
                    member_end + 1,
                ),
                None => (format!("{}{}", target, member), member_end),
            };
            i += splice(nodes, i..end, &code)?;
        }
        Ok(())
    })
}

/// Insert `statement` before the first statement of a function body.
fn insert_first(body: &mut Node, statement: &str) -> Result<()> {
    let Node::Group(group) = body else {
        return Ok(());
    };
    let leading = group
        .children
        .first()
        .map(|n| n.leading().to_string())
        .unwrap_or_else(|| " ".to_string());
    let mut nodes = parse_nodes(statement)?;
    if let Some(first) = nodes.first_mut() {
        first.first_token_mut().leading = leading;
    }
    if group.children.is_empty() && group.close.leading.is_empty() {
        group.close.leading = " ".to_string();
    }
    group.children.splice(0..0, nodes);
    Ok(())
}

fn descriptor(member: &Member) -> String {
    let function = match member.kind {
        Kind::Async => "async function",
        _ => "function",
    };
    let field = match member.kind {
        Kind::Get => "get",
        Kind::Set => "set",
        _ => "value",
    };
    format!(
        "{{ key: {}, {}: {} {} {} }}",
        member.key,
        field,
        function,
        print_trimmed(std::slice::from_ref(&member.params)),
        print_trimmed(std::slice::from_ref(&member.body))
    )
}

/// Replacement range and code for the class at `i`.
fn lower_class(
    nodes: &[Node],
    i: usize,
    level: Level,
    ctx: &mut PassContext,
) -> Result<(Range<usize>, String)> {
    let mut j = i + 1;
    let name = nodes
        .get(j)
        .and_then(Node::ident)
        .filter(|name| *name != "extends")
        .map(str::to_string);
    if name.is_some() {
        j += 1;
    }
    let heritage = if nodes.get(j).is_some_and(|n| n.is_ident("extends")) {
        let start = j + 1;
        j = nodes[start..]
            .iter()
            .position(|n| n.is_group("{"))
            .map(|offset| start + offset)
            .ok_or_else(|| unsupported(&nodes[i], "class without a body"))?;
        if j == start {
            return Err(unsupported(&nodes[i], "`extends` without a superclass"));
        }
        Some(&nodes[start..j])
    } else {
        None
    };
    let Some(Node::Group(body)) = nodes.get(j).filter(|n| n.is_group("{")) else {
        return Err(unsupported(&nodes[i], "class without a body"));
    };

    let declaration = is_declaration(nodes, i, level);
    if declaration && name.is_none() {
        return Err(unsupported(&nodes[i], "class declaration without a name"));
    }
    let name = match name {
        Some(name) => name,
        None => ctx.fresh_name("_class"),
    };
    let superclass = heritage.map(|heritage| match heritage {
        [single] => match single.ident() {
            Some(ident) => ctx.fresh_name(&format!("_{}", ident)),
            None => ctx.fresh_name("_superClass"),
        },
        _ => ctx.fresh_name("_superClass"),
    });

    let (members, constructor) = parse_members(&body.children)?;

    let indent = nodes[i]
        .leading()
        .rsplit('\n')
        .next()
        .filter(|_| nodes[i].has_newline_before())
        .unwrap_or_default()
        .to_string();
    let inner = format!("{}  ", indent);

    ctx.use_helper(Helper::ClassCallCheck);
    let check = format!("_classCallCheck(this, {});", name);
    let (params, body_code) = match constructor {
        Some(mut constructor) => {
            replace_super(&mut constructor.body, superclass.as_deref(), Place::Constructor)?;
            insert_first(&mut constructor.body, &check)?;
            (
                print_trimmed(std::slice::from_ref(&constructor.params)),
                print_trimmed(std::slice::from_ref(&constructor.body)),
            )
        }
        None => match &superclass {
            Some(superclass) => (
                "()".to_string(),
                format!("{{ {} {}.apply(this, arguments); }}", check, superclass),
            ),
            None => ("()".to_string(), format!("{{ {} }}", check)),
        },
    };

    let mut out = format!("function ({}) {{\n", superclass.as_deref().unwrap_or(""));
    if let Some(superclass) = &superclass {
        ctx.use_helper(Helper::Inherits);
        out.push_str(&format!("{}_inherits({}, {});\n\n", inner, name, superclass));
    }
    out.push_str(&format!("{}function {}{} {}\n", inner, name, params, body_code));

    let mut instance = Vec::new();
    let mut statics = Vec::new();
    for mut member in members {
        let place = if member.is_static {
            Place::Static
        } else {
            Place::Prototype
        };
        replace_super(&mut member.body, superclass.as_deref(), place)?;
        if member.is_static {
            statics.push(descriptor(&member));
        } else {
            instance.push(descriptor(&member));
        }
    }
    if !instance.is_empty() || !statics.is_empty() {
        ctx.use_helper(Helper::CreateClass);
        let instance = if instance.is_empty() {
            "null".to_string()
        } else {
            format!("[{}]", instance.join(", "))
        };
        let statics = if statics.is_empty() {
            String::new()
        } else {
            format!(", [{}]", statics.join(", "))
        };
        out.push_str(&format!("\n{}_createClass({}, {}{});\n", inner, name, instance, statics));
    }
    out.push_str(&format!(
        "\n{}return {};\n{}}}({})",
        inner,
        name,
        indent,
        heritage.map(print_trimmed).unwrap_or_default()
    ));

    let code = if declaration {
        format!("let {} = {};", name, out)
    } else {
        format!("({})", out)
    };
    Ok((i..j + 1, code))
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
    fn test_class_declaration() {
        let source = "class Cat {\n  constructor(name) {\n    this.name = name;\n  }\n\n  meow() {\n    return this.name;\n  }\n}\n";
        assert_eq!(
            lower(source).unwrap(),
            "let Cat = function () {\n  \
               function Cat(name) {\n    _classCallCheck(this, Cat);\n    this.name = name;\n  }\n\n  \
               _createClass(Cat, [{ key: 'meow', value: function () {\n    return this.name;\n  } }]);\n\n  \
               return Cat;\n\
             }();\n"
        );
    }

    #[test]
    fn test_subclass_with_super_calls() {
        let out = lower(
            "class Lion extends Cat { constructor(n) { super(n, 1); } meow() { return super.meow() + super.size; } static of(n) { return super.of(n); } }",
        )
        .unwrap();
        assert!(out.starts_with("let Lion = function (_Cat) {\n  _inherits(Lion, _Cat);\n"));
        assert!(out.contains("function Lion(n) { _classCallCheck(this, Lion); _Cat.call(this, n, 1); }"));
        assert!(out.contains(
            "_createClass(Lion, [{ key: 'meow', value: function () { return _Cat.prototype.meow.call(this) + _Cat.prototype.size; } }], \
             [{ key: 'of', value: function (n) { return _Cat.of.call(this, n); } }]);"
        ));
        assert!(out.ends_with("return Lion;\n}(Cat);"));
    }

    #[test]
    fn test_default_derived_constructor_and_accessors() {
        let out = lower("class B extends mixin(A) { get size() { return 1; } set size(v) {} }").unwrap();
        assert!(out.starts_with("let B = function (_superClass) {"));
        assert!(out.contains("function B() { _classCallCheck(this, B); _superClass.apply(this, arguments); }"));
        assert!(out.contains(
            "[{ key: 'size', get: function () { return 1; } }, { key: 'size', set: function (v) {} }]"
        ));
        assert!(out.ends_with("}(mixin(A));"));
    }

    #[test]
    fn test_class_expression_is_parenthesized() {
        let out = lower("var K = class { static make() { return new this(); } };").unwrap();
        assert!(out.starts_with("var K = (function () {\n  function _class() { _classCallCheck(this, _class); }\n"));
        assert!(out.contains("_createClass(_class, null, [{ key: 'make', value: function () { return new this(); } }]);"));
        assert!(out.ends_with("return _class;\n}());"));
    }

    #[test]
    fn test_keyword_as_property_untouched() {
        let source = "el.class = o.class;\nvar o = { class: 1 };\n";
        assert_eq!(lower(source).unwrap(), source);
    }

    #[test]
    fn test_unsupported_members() {
        for source in [
            "class A { x = 1; }",
            "class A { *gen() {} }",
            "class A { m() { return super.m(); } }",
            "class A extends B { m() { super(); } }",
        ] {
            assert!(
                matches!(lower(source), Err(Error::Unsupported(_))),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_helpers_requested() {
        let mut program = parse("class A extends B { m() {} }").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        run(&mut program, &mut ctx).unwrap();
        assert_eq!(
            ctx.helpers().collect::<Vec<_>>(),
            vec![Helper::ClassCallCheck, Helper::CreateClass, Helper::Inherits]
        );
    }
}
