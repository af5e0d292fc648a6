//! Python AST data model.
//!
//! The aligner does not parse source. It consumes an AST produced by an
//! external parser, expressed in these types. Node locations follow the
//! Python `ast` module: 1-based lines, 0-based columns.
//!
//! Constants use a single [`NodeKind::Constant`] kind carrying a [`Literal`],
//! which covers numbers, strings, bytes, `...`, `True`, `False` and `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tugtype_core::Location;

// ============================================================================
// Literal values
// ============================================================================

/// A Python constant value.
///
/// Equality follows Python `==`: `True == 1` and `1 == 1.0` both hold, while
/// strings never equal bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

/// The kind of a [`Literal`], ignoring its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Ellipsis,
}

impl Literal {
    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::None => LiteralKind::None,
            Literal::Bool(_) => LiteralKind::Bool,
            Literal::Int(_) => LiteralKind::Int,
            Literal::Float(_) => LiteralKind::Float,
            Literal::Str(_) => LiteralKind::Str,
            Literal::Bytes(_) => LiteralKind::Bytes,
            Literal::Ellipsis => LiteralKind::Ellipsis,
        }
    }

    /// The string value, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Bool(b) => Some(i64::from(*b)),
            Literal::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Exact `int == float`, without rounding the integer through `f64`.
fn int_eq_float(i: i64, f: f64) -> bool {
    // 2^63; every finite float in [-2^63, 2^63) with no fraction fits in i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::None, Literal::None) | (Literal::Ellipsis, Literal::Ellipsis) => true,
            (Literal::Str(a), Literal::Str(b)) => a == b,
            (Literal::Bytes(a), Literal::Bytes(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a == b,
            (Literal::Float(f), other) | (other, Literal::Float(f)) => {
                other.as_int().is_some_and(|i| int_eq_float(i, *f))
            }
            _ => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Python `repr` of the value.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::Bytes(b) => write!(f, "b'{}'", String::from_utf8_lossy(b)),
            Literal::Ellipsis => f.write_str("Ellipsis"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Literal::Int(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Float(x)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Load/store context of a name, attribute or subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprContext {
    Load,
    Store,
    Del,
    Param,
}

/// One name in an `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Alias {
            name: name.into(),
            asname: None,
        }
    }

    pub fn aliased(name: impl Into<String>, asname: impl Into<String>) -> Self {
        Alias {
            name: name.into(),
            asname: Some(asname.into()),
        }
    }

    /// The name the import binds: `asname` if present, else `name`.
    pub fn bound_name(&self) -> &str {
        self.asname.as_deref().unwrap_or(&self.name)
    }
}

/// A keyword argument in a call. `arg` is `None` for `**kwargs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Node,
}

/// An AST node with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
    pub col: u32,
}

/// The node variants the aligner understands.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Module
    Module {
        body: Vec<Node>,
    },

    // Statements
    FunctionDef {
        name: String,
        args: Vec<Node>,
        body: Vec<Node>,
        decorators: Vec<Node>,
    },
    ClassDef {
        name: String,
        bases: Vec<Node>,
        body: Vec<Node>,
        decorators: Vec<Node>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Assign {
        targets: Vec<Node>,
        value: Box<Node>,
    },
    AugAssign {
        target: Box<Node>,
        op: String,
        value: Box<Node>,
    },
    Expr {
        value: Box<Node>,
    },
    If {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    While {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    Import {
        names: Vec<Alias>,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        level: u32,
    },
    Global {
        names: Vec<String>,
    },
    Pass,
    Break,
    Continue,

    // Expressions
    Attribute {
        value: Box<Node>,
        attr: String,
        ctx: ExprContext,
    },
    Call {
        func: Box<Node>,
        args: Vec<Node>,
        keywords: Vec<Keyword>,
    },
    Name {
        id: String,
        ctx: ExprContext,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
        ctx: ExprContext,
    },
    Constant {
        value: Literal,
    },
    BinOp {
        left: Box<Node>,
        op: String,
        right: Box<Node>,
    },
    BoolOp {
        op: String,
        values: Vec<Node>,
    },
    UnaryOp {
        op: String,
        operand: Box<Node>,
    },
    Compare {
        left: Box<Node>,
        ops: Vec<String>,
        comparators: Vec<Node>,
    },
    IfExp {
        test: Box<Node>,
        body: Box<Node>,
        orelse: Box<Node>,
    },
    Lambda {
        args: Vec<Node>,
        body: Box<Node>,
    },
    Tuple {
        elts: Vec<Node>,
        ctx: ExprContext,
    },
    List {
        elts: Vec<Node>,
        ctx: ExprContext,
    },
    Dict {
        keys: Vec<Node>,
        values: Vec<Node>,
    },
    Slice {
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
        step: Option<Box<Node>>,
    },
    Starred {
        value: Box<Node>,
        ctx: ExprContext,
    },
    /// A function or lambda parameter.
    Arg {
        name: String,
    },
}

impl NodeKind {
    /// The Python `ast` class name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::ClassDef { .. } => "ClassDef",
            NodeKind::Return { .. } => "Return",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::AugAssign { .. } => "AugAssign",
            NodeKind::Expr { .. } => "Expr",
            NodeKind::If { .. } => "If",
            NodeKind::For { .. } => "For",
            NodeKind::While { .. } => "While",
            NodeKind::Import { .. } => "Import",
            NodeKind::ImportFrom { .. } => "ImportFrom",
            NodeKind::Global { .. } => "Global",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Attribute { .. } => "Attribute",
            NodeKind::Call { .. } => "Call",
            NodeKind::Name { .. } => "Name",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::BinOp { .. } => "BinOp",
            NodeKind::BoolOp { .. } => "BoolOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::Compare { .. } => "Compare",
            NodeKind::IfExp { .. } => "IfExp",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::List { .. } => "List",
            NodeKind::Dict { .. } => "Dict",
            NodeKind::Slice { .. } => "Slice",
            NodeKind::Starred { .. } => "Starred",
            NodeKind::Arg { .. } => "arg",
        }
    }

    /// True for kinds that trace alignment matches against.
    pub fn has_match_rule(&self) -> bool {
        matches!(
            self,
            NodeKind::Attribute { .. }
                | NodeKind::Call { .. }
                | NodeKind::Name { .. }
                | NodeKind::Subscript { .. }
                | NodeKind::Constant { .. }
                | NodeKind::Import { .. }
                | NodeKind::ImportFrom { .. }
        )
    }
}

impl Node {
    pub fn new(kind: NodeKind, line: u32, col: u32) -> Self {
        Node { kind, line, col }
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.col)
    }

    /// Direct children in Python `ast` field order.
    pub fn children(&self) -> Vec<&Node> {
        fn opt(n: &Option<Box<Node>>) -> Option<&Node> {
            n.as_deref()
        }

        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::Module { body } => out.extend(body),
            NodeKind::FunctionDef {
                args,
                body,
                decorators,
                ..
            } => {
                out.extend(args);
                out.extend(body);
                out.extend(decorators);
            }
            NodeKind::ClassDef {
                bases,
                body,
                decorators,
                ..
            } => {
                out.extend(bases);
                out.extend(body);
                out.extend(decorators);
            }
            NodeKind::Return { value } => out.extend(opt(value)),
            NodeKind::Assign { targets, value } => {
                out.extend(targets);
                out.push(value);
            }
            NodeKind::AugAssign { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            NodeKind::Expr { value } => out.push(value),
            NodeKind::If { test, body, orelse } | NodeKind::While { test, body, orelse } => {
                out.push(test);
                out.extend(body);
                out.extend(orelse);
            }
            NodeKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                out.push(target);
                out.push(iter);
                out.extend(body);
                out.extend(orelse);
            }
            NodeKind::Import { .. }
            | NodeKind::ImportFrom { .. }
            | NodeKind::Global { .. }
            | NodeKind::Pass
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Name { .. }
            | NodeKind::Constant { .. }
            | NodeKind::Arg { .. } => {}
            NodeKind::Attribute { value, .. } | NodeKind::Starred { value, .. } => out.push(value),
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                out.push(func);
                out.extend(args);
                out.extend(keywords.iter().map(|k| &k.value));
            }
            NodeKind::Subscript { value, slice, .. } => {
                out.push(value);
                out.push(slice);
            }
            NodeKind::BinOp { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::BoolOp { values, .. } => out.extend(values),
            NodeKind::UnaryOp { operand, .. } => out.push(operand),
            NodeKind::Compare {
                left, comparators, ..
            } => {
                out.push(left);
                out.extend(comparators);
            }
            NodeKind::IfExp { test, body, orelse } => {
                out.push(test);
                out.push(body);
                out.push(orelse);
            }
            NodeKind::Lambda { args, body } => {
                out.extend(args);
                out.push(body);
            }
            NodeKind::Tuple { elts, .. } | NodeKind::List { elts, .. } => out.extend(elts),
            NodeKind::Dict { keys, values } => {
                out.extend(keys);
                out.extend(values);
            }
            NodeKind::Slice { lower, upper, step } => {
                out.extend(opt(lower));
                out.extend(opt(upper));
                out.extend(opt(step));
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------------

    pub fn module(body: Vec<Node>) -> Self {
        Node::new(NodeKind::Module { body }, 1, 0)
    }

    pub fn name(id: impl Into<String>, ctx: ExprContext, line: u32, col: u32) -> Self {
        Node::new(NodeKind::Name { id: id.into(), ctx }, line, col)
    }

    /// A `Name` in load context.
    pub fn load(id: impl Into<String>, line: u32, col: u32) -> Self {
        Node::name(id, ExprContext::Load, line, col)
    }

    /// A `Name` in store context.
    pub fn store(id: impl Into<String>, line: u32, col: u32) -> Self {
        Node::name(id, ExprContext::Store, line, col)
    }

    pub fn attribute(
        value: Node,
        attr: impl Into<String>,
        ctx: ExprContext,
        line: u32,
        col: u32,
    ) -> Self {
        Node::new(
            NodeKind::Attribute {
                value: Box::new(value),
                attr: attr.into(),
                ctx,
            },
            line,
            col,
        )
    }

    pub fn call(func: Node, args: Vec<Node>, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::Call {
                func: Box::new(func),
                args,
                keywords: Vec::new(),
            },
            line,
            col,
        )
    }

    pub fn constant(value: impl Into<Literal>, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::Constant {
                value: value.into(),
            },
            line,
            col,
        )
    }

    pub fn subscript(value: Node, slice: Node, ctx: ExprContext, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::Subscript {
                value: Box::new(value),
                slice: Box::new(slice),
                ctx,
            },
            line,
            col,
        )
    }

    pub fn slice(
        lower: Option<Node>,
        upper: Option<Node>,
        step: Option<Node>,
        line: u32,
        col: u32,
    ) -> Self {
        Node::new(
            NodeKind::Slice {
                lower: lower.map(Box::new),
                upper: upper.map(Box::new),
                step: step.map(Box::new),
            },
            line,
            col,
        )
    }

    pub fn bin_op(left: Node, op: impl Into<String>, right: Node, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::BinOp {
                left: Box::new(left),
                op: op.into(),
                right: Box::new(right),
            },
            line,
            col,
        )
    }

    pub fn lambda(args: Vec<Node>, body: Node, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::Lambda {
                args,
                body: Box::new(body),
            },
            line,
            col,
        )
    }

    pub fn assign(targets: Vec<Node>, value: Node, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::Assign {
                targets,
                value: Box::new(value),
            },
            line,
            col,
        )
    }

    /// An expression statement located at its expression.
    pub fn expr(value: Node) -> Self {
        let (line, col) = (value.line, value.col);
        Node::new(
            NodeKind::Expr {
                value: Box::new(value),
            },
            line,
            col,
        )
    }

    pub fn import(names: Vec<Alias>, line: u32, col: u32) -> Self {
        Node::new(NodeKind::Import { names }, line, col)
    }

    pub fn import_from(module: impl Into<String>, names: Vec<Alias>, line: u32, col: u32) -> Self {
        Node::new(
            NodeKind::ImportFrom {
                module: Some(module.into()),
                names,
                level: 0,
            },
            line,
            col,
        )
    }

    pub fn function_def(
        name: impl Into<String>,
        args: Vec<Node>,
        body: Vec<Node>,
        line: u32,
        col: u32,
    ) -> Self {
        Node::new(
            NodeKind::FunctionDef {
                name: name.into(),
                args,
                body,
                decorators: Vec::new(),
            },
            line,
            col,
        )
    }

    pub fn arg(name: impl Into<String>, line: u32, col: u32) -> Self {
        Node::new(NodeKind::Arg { name: name.into() }, line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod literal_tests {
        use super::*;

        #[test]
        fn python_numeric_equality() {
            assert_eq!(Literal::Bool(true), Literal::Int(1));
            assert_eq!(Literal::Int(1), Literal::Float(1.0));
            assert_eq!(Literal::Bool(false), Literal::Float(0.0));
            assert_ne!(Literal::Int(2), Literal::Bool(true));
            assert_ne!(Literal::Float(0.5), Literal::Int(0));
        }

        #[test]
        fn large_int_float_equality_is_exact() {
            let big = 9_007_199_254_740_993_i64;
            assert_ne!(Literal::Int(big), Literal::Float(9_007_199_254_740_992.0));
            assert_ne!(Literal::Float(9_007_199_254_740_992.0), Literal::Int(big));
            assert_eq!(Literal::Int(big - 1), Literal::Float(9_007_199_254_740_992.0));
            assert_ne!(Literal::Int(i64::MAX), Literal::Float(9_223_372_036_854_775_808.0));
            assert_ne!(Literal::Int(0), Literal::Float(f64::NAN));
        }

        #[test]
        fn strings_never_equal_bytes() {
            assert_ne!(Literal::from("x"), Literal::Bytes(b"x".to_vec()));
            assert_ne!(Literal::None, Literal::Int(0));
            assert_eq!(Literal::Ellipsis, Literal::Ellipsis);
        }

        #[test]
        fn repr_display() {
            assert_eq!(Literal::from("hi").to_string(), "'hi'");
            assert_eq!(Literal::Float(1.0).to_string(), "1.0");
            assert_eq!(Literal::Bool(true).to_string(), "True");
            assert_eq!(Literal::Bytes(b"ab".to_vec()).to_string(), "b'ab'");
            assert_eq!(Literal::None.to_string(), "None");
        }

        #[test]
        fn kind_ignores_value() {
            assert_eq!(Literal::Int(3).kind(), LiteralKind::Int);
            assert_ne!(Literal::Bool(true).kind(), Literal::Int(1).kind());
        }
    }

    mod node_tests {
        use super::*;

        #[test]
        fn children_follow_field_order() {
            let call = Node::call(
                Node::load("f", 1, 0),
                vec![Node::load("a", 1, 2), Node::constant(1, 1, 5)],
                1,
                0,
            );
            let kinds: Vec<&str> = call.children().iter().map(|n| n.kind.name()).collect();
            assert_eq!(kinds, vec!["Name", "Name", "Constant"]);
        }

        #[test]
        fn alias_bound_name() {
            assert_eq!(Alias::new("os").bound_name(), "os");
            assert_eq!(Alias::aliased("sys", "tzt").bound_name(), "tzt");
        }

        #[test]
        fn match_rule_kinds() {
            assert!(Node::load("x", 1, 0).kind.has_match_rule());
            assert!(Node::import(vec![Alias::new("os")], 1, 0).kind.has_match_rule());
            assert!(!Node::module(vec![]).kind.has_match_rule());
            assert!(!Node::bin_op(Node::constant(1, 1, 0), "+", Node::constant(2, 1, 4), 1, 0)
                .kind
                .has_match_rule());
        }
    }
}
