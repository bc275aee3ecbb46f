use std::fmt;
use std::sync::Arc;

use cadence_core::{EntityRef, Value};
use cadence_expr::Expression;

use crate::chooser::Chooser;
use crate::context::{Frame, SimContext};
use crate::error::SimResult;

/// How one field gets its value when an occurrence is materialized.
#[derive(Clone)]
pub enum Binding {
    /// A fixed value, returned unchanged.
    Literal(Value),
    /// An expression over `sim`, `parent` and `timestamp`, evaluated fresh
    /// for every occurrence.
    Expression(Expression),
    /// A delegate that may draw from the simulation RNG.
    Chooser(Arc<dyn Chooser>),
}

impl Binding {
    /// A literal binding.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Parse an expression binding.
    pub fn expression(text: &str) -> SimResult<Self> {
        Ok(Self::Expression(Expression::parse(text)?))
    }

    /// Wrap a chooser.
    pub fn chooser(chooser: impl Chooser + 'static) -> Self {
        Self::Chooser(Arc::new(chooser))
    }

    /// Compute the value for an occurrence of `parent` at `timestamp`,
    /// against the state as it is right now.
    pub fn resolve(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        timestamp: i64,
    ) -> SimResult<Value> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Expression(expr) => {
                Ok(expr.evaluate(&Frame::new(ctx.state, parent, timestamp))?)
            }
            Self::Chooser(chooser) => chooser.choose(ctx, parent, timestamp),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Expression(expr) => f.debug_tuple("Expression").field(&expr.as_str()).finish(),
            Self::Chooser(chooser) => f.debug_tuple("Chooser").field(chooser).finish(),
        }
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<Expression> for Binding {
    fn from(expr: Expression) -> Self {
        Self::Expression(expr)
    }
}

/// Field bindings of one emitter, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Bindings(Vec<(String, Binding)>);

impl Bindings {
    /// No bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `field`, replacing any earlier binding for it in place.
    pub fn insert(&mut self, field: impl Into<String>, binding: impl Into<Binding>) {
        let field = field.into();
        let binding = binding.into();
        match self.0.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = binding,
            None => self.0.push((field, binding)),
        }
    }

    /// Builder form of [`Bindings::insert`].
    pub fn with(mut self, field: impl Into<String>, binding: impl Into<Binding>) -> Self {
        self.insert(field, binding);
        self
    }

    /// Bound field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// `(field, binding)` pairs, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.0.iter().map(|(name, b)| (name.as_str(), b))
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve every binding in declaration order. Failures name the
    /// `type_name.field` being resolved.
    pub fn resolve_all(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        timestamp: i64,
        type_name: &str,
    ) -> SimResult<Vec<(String, Value)>> {
        self.0
            .iter()
            .map(|(field, binding)| {
                binding
                    .resolve(ctx, parent, timestamp)
                    .map(|value| (field.clone(), value))
                    .map_err(|e| e.resolving(format!("{type_name}.{field}")))
            })
            .collect()
    }
}

impl FromIterator<(String, Binding)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Binding)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (field, binding) in iter {
            bindings.insert(field, binding);
        }
        bindings
    }
}
