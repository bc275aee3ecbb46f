use std::fmt;
use std::sync::Arc;

use cadence_core::{EntityRef, TypeName};

use crate::binding::Bindings;

/// What a mutation request creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Append an event to its type's registry.
    AddEvent,
    /// Append an entity to its type's live-list.
    AddEntity,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddEvent => write!(f, "add-event"),
            Self::AddEntity => write!(f, "add-entity"),
        }
    }
}

/// An intent to create one event or entity, produced by an emitter and
/// applied by the simulation after every entity has been updated.
///
/// Bindings are not resolved until the request is applied.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    /// Event or entity.
    pub kind: MutationKind,
    /// The type to instantiate.
    pub type_name: TypeName,
    /// Field bindings, shared with the emitter.
    pub bindings: Arc<Bindings>,
    /// The entity whose emitter produced the request.
    pub parent: EntityRef,
    /// The occurrence timestamp.
    pub timestamp: i64,
}

impl fmt::Display for MutationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {} from {}",
            self.kind, self.type_name, self.timestamp, self.parent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_display() {
        let request = MutationRequest {
            kind: MutationKind::AddEvent,
            type_name: "Purchase".into(),
            bindings: Arc::new(Bindings::new()),
            parent: EntityRef::new("Customer", 2),
            timestamp: 3600,
        };
        assert_eq!(request.to_string(), "add-event Purchase at 3600 from Customer#2");
    }
}
