//! Closed expression language for parameter bindings.
//!
//! Expressions read simulation state through three roots (`sim`, `parent`,
//! `timestamp`) and a handful of built-ins. There is no assignment and no
//! access to anything outside the [`Scope`] they are evaluated against.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;

use cadence_core::Value;

pub use diagnostics::{Diagnostic, render_diagnostics};
pub use error::{ExprError, ExprResult};
pub use eval::{Scope, attribute};

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    ast: ast::Expr,
}

impl Expression {
    /// Lex and parse `text`. Every lexer and parser error is collected into
    /// one [`ExprError::Syntax`].
    pub fn parse(text: &str) -> ExprResult<Self> {
        let (tokens, lex_errors) = lexer::lex(text);

        let mut diagnostics: Vec<Diagnostic> = lex_errors
            .into_iter()
            .map(|e| Diagnostic::new(e.span, e.message))
            .collect();

        match parser::parse(&tokens, text.len()) {
            Ok(ast) if diagnostics.is_empty() => Ok(Self {
                text: text.to_string(),
                ast,
            }),
            Ok(_) => Err(ExprError::Syntax {
                text: text.to_string(),
                diagnostics,
            }),
            Err(parse_errors) => {
                diagnostics.extend(
                    parse_errors
                        .into_iter()
                        .map(|e| Diagnostic::new(e.span, e.message)),
                );
                diagnostics.sort_by_key(|d| d.span.start);
                Err(ExprError::Syntax {
                    text: text.to_string(),
                    diagnostics,
                })
            }
        }
    }

    /// `sim.<name>`, built without going through the parser.
    pub fn sim_attribute(name: &str) -> Self {
        Self {
            text: format!("sim.{name}"),
            ast: ast::Expr::attr(ast::Expr::Root(ast::Root::Sim), name),
        }
    }

    /// Evaluate against a scope.
    pub fn evaluate(&self, scope: &dyn Scope) -> ExprResult<Value> {
        eval::evaluate(&self.ast, scope)
    }

    /// The source text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed tree.
    pub fn ast(&self) -> &ast::Expr {
        &self.ast
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for Expression {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
