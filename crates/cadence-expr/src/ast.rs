use std::fmt;

use cadence_core::Value;

/// Source span as a byte range.
pub type Span = std::ops::Range<usize>;

/// The three names an expression can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// The simulation (`sim`).
    Sim,
    /// The entity that owns the emitter (`parent`).
    Parent,
    /// The occurrence timestamp (`timestamp`).
    Timestamp,
}

impl Root {
    /// Map a word to a root name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sim" => Some(Self::Sim),
            "parent" => Some(Self::Parent),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// `len(list | string)`
    Len,
    /// `int(x)`: truncating conversion.
    Int,
    /// `float(x)`
    Float,
    /// `str(x)`
    Str,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
    /// `abs(x)`
    Abs,
}

impl Func {
    /// Map a word to a function.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Self::Len),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Len => "len",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Min => "min",
            Self::Max => "max",
            Self::Abs => "abs",
        };
        f.write_str(name)
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical negation.
    Not,
}

/// Infix operators, loosest binding last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `*`
    Mul,
    /// `/` (always produces a float)
    Div,
    /// `%`
    Rem,
    /// `+` (also concatenates strings and lists)
    Add,
    /// `-`
    Sub,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Short-circuiting `and`.
    And,
    /// Short-circuiting `or`.
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        };
        f.write_str(symbol)
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal scalar.
    Literal(Value),
    /// A list literal.
    List(Vec<Expr>),
    /// One of the three context roots.
    Root(Root),
    /// `target.name`
    Attr {
        /// The expression whose attribute is read.
        target: Box<Expr>,
        /// The attribute name.
        name: String,
    },
    /// `target[index]`
    Index {
        /// The list or string being indexed.
        target: Box<Expr>,
        /// The index expression.
        index: Box<Expr>,
    },
    /// `func(args...)`
    Call {
        /// The built-in being called.
        func: Func,
        /// Argument expressions.
        args: Vec<Expr>,
    },
    /// A prefix operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        expr: Box<Expr>,
    },
    /// An infix operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn attr(target: Expr, name: impl Into<String>) -> Self {
        Self::Attr {
            target: Box::new(target),
            name: name.into(),
        }
    }

    pub(crate) fn index(target: Expr, index: Expr) -> Self {
        Self::Index {
            target: Box::new(target),
            index: Box::new(index),
        }
    }

    pub(crate) fn unary(op: UnaryOp, expr: Expr) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub(crate) fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}
