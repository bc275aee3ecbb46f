use crate::ast::{BinaryOp, Func};
use crate::diagnostics::{Diagnostic, render_diagnostics};

/// Alias for `Result<T, ExprError>`.
pub type ExprResult<T> = Result<T, ExprError>;

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    /// The expression text did not lex or parse.
    #[error("invalid expression `{text}`: {}", first_message(.diagnostics))]
    Syntax {
        /// The expression text.
        text: String,
        /// Every lexer and parser error, in source order.
        diagnostics: Vec<Diagnostic>,
    },

    /// An attribute does not exist on the value it was read from.
    #[error("{owner} has no attribute `{name}`")]
    UnknownAttribute {
        /// Description of the value being read.
        owner: String,
        /// The missing attribute.
        name: String,
    },

    /// `sim.entities.X` or `sim.events.X` named a type that is not registered.
    #[error("no {namespace} type named `{name}`")]
    UnknownType {
        /// `entity` or `event`.
        namespace: &'static str,
        /// The requested type name.
        name: String,
    },

    /// An operator was applied to values it does not support.
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    BinaryMismatch {
        /// The operator.
        op: BinaryOp,
        /// Kind of the left operand.
        lhs: &'static str,
        /// Kind of the right operand.
        rhs: &'static str,
    },

    /// A prefix operator, function or index received a value of the wrong kind.
    #[error("{context} expects {expected}, got {found}")]
    TypeMismatch {
        /// What was being evaluated.
        context: String,
        /// The accepted kind(s).
        expected: &'static str,
        /// The kind received.
        found: &'static str,
    },

    /// A list or string index fell outside its bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// The length of the indexed value.
        len: usize,
    },

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed. Holds the operator or function name.
    #[error("integer overflow in `{0}`")]
    Overflow(String),

    /// A conversion function could not convert its argument.
    #[error("`{func}` cannot convert {value:?}")]
    Conversion {
        /// The conversion function.
        func: Func,
        /// The rendered argument.
        value: String,
    },

    /// `sim` or one of its namespaces was used where a value is needed.
    #[error("`{0}` is not a value; read one of its attributes")]
    NotAValue(String),
}

impl ExprError {
    /// Render syntax errors with ariadne. Other errors render as their
    /// display text.
    pub fn render(&self, label: &str) -> String {
        match self {
            Self::Syntax { text, diagnostics } => render_diagnostics(text, label, diagnostics),
            other => format!("{label}: {other}\n"),
        }
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "syntax error".to_string())
}
