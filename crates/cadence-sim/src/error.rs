use std::path::PathBuf;

use cadence_core::CoreError;
use cadence_expr::ExprError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// An emitter named both an event type and an entity type.
    #[error("emitter `{emitter}` names both an event type and an entity type")]
    AmbiguousTarget {
        /// The emitter's name.
        emitter: String,
    },

    /// An emitter named neither an event type nor an entity type.
    #[error("emitter `{emitter}` names neither an event type nor an entity type")]
    MissingTarget {
        /// The emitter's name.
        emitter: String,
    },

    /// A mutation or emitter refers to an event type that is not registered.
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),

    /// A mutation or emitter refers to an entity type that is not registered.
    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),

    /// Two types of the same namespace share a name.
    #[error("{namespace} type `{name}` is registered twice")]
    DuplicateType {
        /// `entity` or `event`.
        namespace: &'static str,
        /// The duplicated name.
        name: String,
    },

    /// An emitter parameter is outside its valid range.
    #[error("{strategy} emitter: invalid {parameter}: {reason}")]
    Distribution {
        /// `interval`, `poisson` or `gamma`.
        strategy: &'static str,
        /// The offending parameter.
        parameter: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A binding failed to resolve.
    #[error("cannot resolve `{field}`: {source}")]
    Resolve {
        /// `Type.field` being resolved.
        field: String,
        /// The underlying failure.
        source: Box<SimError>,
    },

    /// Expression parse or evaluation failure.
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// Field validation failure.
    #[error(transparent)]
    Field(#[from] CoreError),

    /// A chooser could not produce a value.
    #[error("chooser failed: {0}")]
    Chooser(String),

    /// Invalid simulation configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A scenario file did not deserialize.
    #[error("invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),

    /// A scenario file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl SimError {
    /// Wrap this error with the `Type.field` whose binding produced it.
    pub fn resolving(self, field: impl Into<String>) -> Self {
        Self::Resolve {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past any `Resolve` wrappers.
    pub fn root_cause(&self) -> &SimError {
        match self {
            Self::Resolve { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_wraps_and_unwraps() {
        let err = SimError::Chooser("empty list".into())
            .resolving("Order.item")
            .resolving("Order.item_copy");
        assert_eq!(
            err.to_string(),
            "cannot resolve `Order.item_copy`: cannot resolve `Order.item`: chooser failed: empty list"
        );
        assert!(matches!(err.root_cause(), SimError::Chooser(_)));
    }

    #[test]
    fn distribution_message() {
        let err = SimError::Distribution {
            strategy: "poisson",
            parameter: "rate",
            reason: "must be non-negative, got -1".into(),
        };
        assert_eq!(
            err.to_string(),
            "poisson emitter: invalid rate: must be non-negative, got -1"
        );
    }
}
