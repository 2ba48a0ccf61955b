//! Transform passes.
//!
//! Each pass rewrites the token tree in place. Replacement code is built
//! as text and parsed back into nodes, which then take over the leading
//! trivia of the nodes they replace.

pub mod arrow;
pub mod block_scoping;
pub mod classes;
pub mod computed;
pub mod destructuring;
pub mod for_of;
pub mod jsx;
pub mod literals;
pub mod modules;
pub mod parameters;
pub mod shorthand;
pub mod spread;
pub mod template;

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

pub use crate::js::syntax::{is_function_body, is_parameter_list};

use crate::js::syntax::{visit, Level};
use crate::js::{parse_nodes, Fragment, Node, TokenKind};
use crate::transpile::preset::Pass;
use crate::Result;

/// Assignment operators, compound ones included.
pub const ASSIGNMENT_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

/// Runtime support functions emitted once at the end of a file.
///
/// Declaration order is emission order; every helper is a function
/// declaration so it is hoisted above its first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Helper {
    InteropRequireDefault,
    ClassCallCheck,
    CreateClass,
    Inherits,
    DefineProperty,
    ToConsumableArray,
}

impl Helper {
    pub fn code(&self) -> &'static str {
        match self {
            Helper::InteropRequireDefault => {
                "function _interopRequireDefault(obj) { return obj && obj.__esModule ? obj : { default: obj }; }"
            }
            Helper::ClassCallCheck => {
                "function _classCallCheck(instance, Constructor) { if (!(instance instanceof Constructor)) { throw new TypeError('Cannot call a class as a function'); } }"
            }
            Helper::CreateClass => {
                "function _defineProperties(target, props) { for (var i = 0; i < props.length; i++) { var descriptor = props[i]; descriptor.enumerable = descriptor.enumerable || false; descriptor.configurable = true; if ('value' in descriptor) descriptor.writable = true; Object.defineProperty(target, descriptor.key, descriptor); } }\n\n\
                 function _createClass(Constructor, protoProps, staticProps) { if (protoProps) _defineProperties(Constructor.prototype, protoProps); if (staticProps) _defineProperties(Constructor, staticProps); return Constructor; }"
            }
            Helper::Inherits => {
                "function _inherits(subClass, superClass) { if (typeof superClass !== 'function' && superClass !== null) { throw new TypeError('Super expression must either be null or a function, not ' + typeof superClass); } subClass.prototype = Object.create(superClass && superClass.prototype, { constructor: { value: subClass, enumerable: false, writable: true, configurable: true } }); if (superClass) Object.setPrototypeOf ? Object.setPrototypeOf(subClass, superClass) : subClass.__proto__ = superClass; }"
            }
            Helper::DefineProperty => {
                "function _defineProperty(obj, key, value) { if (key in obj) { Object.defineProperty(obj, key, { value: value, enumerable: true, configurable: true, writable: true }); } else { obj[key] = value; } return obj; }"
            }
            Helper::ToConsumableArray => {
                "function _toConsumableArray(arr) { if (Array.isArray(arr)) { for (var i = 0, arr2 = Array(arr.length); i < arr.length; i++) { arr2[i] = arr[i]; } return arr2; } return Array.from(arr); }"
            }
        }
    }
}

/// Per-file state shared by the passes.
#[derive(Debug)]
pub struct PassContext {
    pub pragma: String,
    helpers: BTreeSet<Helper>,
    used_names: HashSet<String>,
}

impl PassContext {
    pub fn new(pragma: &str, program: &Fragment) -> Self {
        let mut used_names = HashSet::new();
        visit(&program.nodes, Level::Program, &mut |nodes, _| {
            for node in nodes {
                if let Some(name) = node.ident() {
                    used_names.insert(name.to_string());
                }
            }
        });
        Self {
            pragma: pragma.to_string(),
            helpers: BTreeSet::new(),
            used_names,
        }
    }

    /// Request `helper`; it is emitted once however often it is requested.
    pub fn use_helper(&mut self, helper: Helper) {
        self.helpers.insert(helper);
    }

    pub fn helpers(&self) -> impl Iterator<Item = Helper> + '_ {
        self.helpers.iter().copied()
    }

    /// Append the requested helpers to the printed program.
    pub fn append_helpers(&self, out: &mut String) {
        if self.helpers.is_empty() {
            return;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for helper in &self.helpers {
            out.push('\n');
            out.push_str(helper.code());
            out.push('\n');
        }
    }

    /// A name not used anywhere in the file: `base`, `base2`, `base3`...
    pub fn fresh_name(&mut self, base: &str) -> String {
        let mut n = 1;
        loop {
            let name = if n == 1 {
                base.to_string()
            } else {
                format!("{}{}", base, n)
            };
            if self.used_names.insert(name.clone()) {
                return name;
            }
            n += 1;
        }
    }
}

pub fn apply(pass: Pass, program: &mut Fragment, ctx: &mut PassContext) -> Result<()> {
    match pass {
        Pass::Jsx => jsx::run(program, ctx),
        Pass::ModulesCommonjs => modules::run(program, ctx),
        Pass::Classes => classes::run(program, ctx),
        Pass::ShorthandProperties => shorthand::run(program),
        Pass::ComputedProperties => computed::run(program, ctx),
        Pass::TemplateLiterals => template::run(program),
        Pass::Literals => literals::run(program),
        Pass::Destructuring => destructuring::run(program, ctx),
        Pass::ForOf => for_of::run(program, ctx),
        Pass::ArrowFunctions => arrow::run(program, ctx),
        Pass::Parameters => parameters::run(program),
        Pass::Spread => spread::run(program, ctx),
        Pass::BlockScoping => block_scoping::run(program, ctx),
    }
}

/// Replace `range` with the nodes parsed from `code`.
///
/// Returns the number of nodes inserted.
pub fn splice(nodes: &mut Vec<Node>, range: Range<usize>, code: &str) -> Result<usize> {
    let mut replacement = parse_nodes(code)?;
    if let (Some(first), Some(old)) = (replacement.first_mut(), nodes.get(range.start)) {
        first.first_token_mut().leading = old.leading().to_string();
    }
    let inserted = replacement.len();
    nodes.splice(range, replacement);
    Ok(inserted)
}

/// Insert `code` at the start of a block.
pub fn prepend(block: &mut Node, code: &str) -> Result<()> {
    if let Node::Group(group) = block {
        let statements = parse_nodes(code)?;
        group.children.splice(0..0, statements);
    }
    Ok(())
}

/// Quote `value` as a single-quoted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{a0}' => out.push_str("\\xA0"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Whether `name` can be written as a bare property key.
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Whether the identifier at `i` is used as a variable: not a property
/// name after `.`, not an object literal key and not a method name.
pub fn is_variable_at(nodes: &[Node], i: usize) -> bool {
    let prev = i.checked_sub(1).map(|p| &nodes[p]);
    if prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?.")) {
        return false;
    }
    let is_key = nodes.get(i + 1).is_some_and(|n| n.is_punct(":"))
        && prev.map_or(true, |p| p.is_punct(","));
    let is_method = nodes.get(i + 1).is_some_and(|n| n.is_group("("))
        && nodes.get(i + 2).is_some_and(|n| n.is_group("{"))
        && prev.map_or(true, |p| {
            p.is_punct(",")
                || p.is_punct("*")
                || p.is_punct(";")
                || ["get", "set", "static", "async"].iter().any(|k| p.is_ident(k))
        });
    !is_key && !is_method
}

/// Whether `name` is used as a variable anywhere in `nodes`, nested
/// functions and template substitutions included.
pub fn references_name(nodes: &[Node], name: &str) -> bool {
    let mut found = false;
    visit(nodes, Level::Program, &mut |seq, _| {
        if !found {
            found = (0..seq.len()).any(|i| seq[i].is_ident(name) && is_variable_at(seq, i));
        }
    });
    found
}

/// Whether `this` is used at this function level: nested `function`
/// bodies are skipped, everything else is searched.
pub fn uses_this(nodes: &[Node]) -> bool {
    let mut i = 0;
    while i < nodes.len() {
        match &nodes[i] {
            Node::Token(token) => match &token.kind {
                TokenKind::Ident if token.text == "this" => return true,
                TokenKind::Ident if token.text == "function" => {
                    // Skip to the function body and past it.
                    match nodes[i..].iter().position(|n| n.is_group("{")) {
                        Some(offset) => i += offset,
                        None => return false,
                    }
                }
                TokenKind::Template(template) => {
                    if template.exprs.iter().any(|expr| uses_this(&expr.nodes)) {
                        return true;
                    }
                }
                _ => {}
            },
            Node::Group(group) => {
                if uses_this(&group.children) {
                    return true;
                }
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse, print_nodes};

    #[test]
    fn test_fresh_name_avoids_used_identifiers() {
        let program = parse("var _ref = 1, _ref2 = 2;").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        assert_eq!(ctx.fresh_name("_ref"), "_ref3");
        assert_eq!(ctx.fresh_name("_ref"), "_ref4");
        assert_eq!(ctx.fresh_name("_react"), "_react");
    }

    #[test]
    fn test_splice_keeps_leading_trivia() {
        let mut nodes = parse("a;\n  b;").unwrap().nodes;
        let inserted = splice(&mut nodes, 2..3, "f(x)").unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(print_nodes(&nodes), "a;\n  f(x);");
    }

    #[test]
    fn test_helpers_emitted_once_in_order() {
        let program = parse("x;").unwrap();
        let mut ctx = PassContext::new("React.createElement", &program);
        ctx.use_helper(Helper::ToConsumableArray);
        ctx.use_helper(Helper::InteropRequireDefault);
        ctx.use_helper(Helper::ToConsumableArray);
        let mut out = "x;".to_string();
        ctx.append_helpers(&mut out);
        assert_eq!(
            out,
            format!(
                "x;\n\n{}\n\n{}\n",
                Helper::InteropRequireDefault.code(),
                Helper::ToConsumableArray.code()
            )
        );
    }

    #[test]
    fn test_references_name() {
        let n = parse("f(a.b, { b: 1 }, `${c}`, x ? b : d)").unwrap().nodes;
        assert!(references_name(&n, "b"));
        assert!(references_name(&n, "c"));
        let n = parse("f(a.b, { b: 1 }, { get b() {} })").unwrap().nodes;
        assert!(!references_name(&n, "b"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b\nc"), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_is_identifier_name() {
        assert!(is_identifier_name("className"));
        assert!(is_identifier_name("$el"));
        assert!(!is_identifier_name("data-id"));
        assert!(!is_identifier_name("1x"));
    }

    #[test]
    fn test_uses_this_skips_nested_functions() {
        assert!(uses_this(&parse("this.x + 1").unwrap().nodes));
        assert!(uses_this(&parse("f(`${this.y}`)").unwrap().nodes));
        assert!(!uses_this(&parse("function () { return this; }").unwrap().nodes));
        assert!(uses_this(&parse("function () {}.bind(this)").unwrap().nodes));
    }
}
