//! Emitters decide when, within a tick's window, occurrences happen, and turn
//! each occurrence into a [`MutationRequest`].

mod gamma;
mod interval;
mod poisson;

use std::sync::Arc;

use cadence_core::{EntityRef, TypeName};

pub use gamma::GammaEmitter;
pub use interval::{IntervalEmitter, Offset, Spacing};
pub use poisson::PoissonEmitter;

use crate::binding::Bindings;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::mutation::{MutationKind, MutationRequest};

/// What an emitter creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Events of the named type.
    Event(TypeName),
    /// Entities of the named type.
    Entity(TypeName),
}

impl Target {
    /// Build a target from optional event and entity type names. Exactly one
    /// must be given.
    pub fn from_names(emitter: &str, event: Option<&str>, entity: Option<&str>) -> SimResult<Self> {
        match (event, entity) {
            (Some(event), None) => Ok(Self::Event(event.into())),
            (None, Some(entity)) => Ok(Self::Entity(entity.into())),
            (Some(_), Some(_)) => Err(SimError::AmbiguousTarget {
                emitter: emitter.to_string(),
            }),
            (None, None) => Err(SimError::MissingTarget {
                emitter: emitter.to_string(),
            }),
        }
    }

    /// The mutation this target produces.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Event(_) => MutationKind::AddEvent,
            Self::Entity(_) => MutationKind::AddEntity,
        }
    }

    /// The targeted type.
    pub fn type_name(&self) -> &TypeName {
        match self {
            Self::Event(name) | Self::Entity(name) => name,
        }
    }
}

/// Scheduling strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Regular grid with optional spacing jitter, offsets and skipping.
    Interval(IntervalEmitter),
    /// Homogeneous Poisson arrivals.
    Poisson(PoissonEmitter),
    /// Renewal process with Gamma-distributed gaps.
    Gamma(GammaEmitter),
}

impl Strategy {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interval(_) => "interval",
            Self::Poisson(_) => "poisson",
            Self::Gamma(_) => "gamma",
        }
    }

    /// Occurrence timestamps in `[prev, tick)` for `parent`.
    pub fn schedule(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<i64>> {
        match self {
            Self::Interval(s) => s.schedule(ctx, parent, prev, tick),
            Self::Poisson(s) => s.schedule(ctx, prev, tick),
            Self::Gamma(s) => s.schedule(ctx, prev, tick),
        }
    }
}

impl From<IntervalEmitter> for Strategy {
    fn from(s: IntervalEmitter) -> Self {
        Self::Interval(s)
    }
}

impl From<PoissonEmitter> for Strategy {
    fn from(s: PoissonEmitter) -> Self {
        Self::Poisson(s)
    }
}

impl From<GammaEmitter> for Strategy {
    fn from(s: GammaEmitter) -> Self {
        Self::Gamma(s)
    }
}

/// A named emitter: a target, a strategy and the field bindings every
/// request it produces carries.
#[derive(Debug, Clone)]
pub struct Emitter {
    name: String,
    target: Target,
    strategy: Strategy,
    bindings: Arc<Bindings>,
}

impl Emitter {
    /// Create an emitter with no field bindings.
    pub fn new(name: impl Into<String>, target: Target, strategy: impl Into<Strategy>) -> Self {
        Self {
            name: name.into(),
            target,
            strategy: strategy.into(),
            bindings: Arc::new(Bindings::new()),
        }
    }

    /// Set the field bindings.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = Arc::new(bindings);
        self
    }

    /// The emitter's name, unique within its entity type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the emitter creates.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// How it schedules.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Field bindings.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Occurrence timestamps in `[prev, tick)`.
    pub fn schedule(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<i64>> {
        self.strategy.schedule(ctx, parent, prev, tick)
    }

    /// One mutation request per scheduled occurrence.
    pub fn emit(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<MutationRequest>> {
        let timestamps = self.schedule(ctx, parent, prev, tick)?;
        tracing::trace!(
            emitter = %self.name,
            parent = %parent,
            strategy = self.strategy.name(),
            count = timestamps.len(),
            "scheduled occurrences"
        );
        Ok(timestamps
            .into_iter()
            .map(|timestamp| MutationRequest {
                kind: self.target.kind(),
                type_name: self.target.type_name().clone(),
                bindings: Arc::clone(&self.bindings),
                parent: parent.clone(),
                timestamp,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::entity::EntityType;
    use crate::state::SimState;
    use cadence_core::{Fields, Value};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn target_requires_exactly_one_name() {
        assert_eq!(
            Target::from_names("sale", Some("Purchase"), None).unwrap(),
            Target::Event("Purchase".into())
        );
        assert_eq!(
            Target::from_names("signup", None, Some("Customer")).unwrap(),
            Target::Entity("Customer".into())
        );
        assert!(matches!(
            Target::from_names("x", Some("A"), Some("B")),
            Err(SimError::AmbiguousTarget { .. })
        ));
        assert!(matches!(
            Target::from_names("x", None, None),
            Err(SimError::MissingTarget { .. })
        ));
    }

    #[test]
    fn emit_builds_one_request_per_occurrence() {
        let mut state = SimState::new(1, 0, 3600);
        state
            .register_entity_type(EntityType::new("Customer"))
            .unwrap();
        let parent = state.push_entity(0, Fields::new(), None);
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = SimContext::new(&state, &mut rng);

        let emitter = Emitter::new(
            "sale",
            Target::Event("Purchase".into()),
            IntervalEmitter::new().with_interval(Binding::literal(600i64)),
        )
        .with_bindings(Bindings::new().with("amount", Value::Float(1.0)));

        let requests = emitter.emit(&mut ctx, &parent, 0, 3600).unwrap();
        assert_eq!(requests.len(), 6);
        assert!(requests.iter().all(|r| r.kind == MutationKind::AddEvent));
        assert!(requests.iter().all(|r| r.parent == parent));
        assert_eq!(
            requests.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![0, 600, 1200, 1800, 2400, 3000]
        );
        assert_eq!(requests[0].bindings.len(), 1);
    }
}
