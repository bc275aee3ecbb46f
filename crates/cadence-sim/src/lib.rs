//! Tick-based event emission engine for Cadence.
//!
//! Entities carry emitters. Every tick, each emitter schedules occurrences
//! within the tick's window and turns them into mutation requests; the
//! simulation applies the requests in order, resolving field bindings against
//! the state as it stands at that moment. All randomness comes from one
//! seeded RNG owned by the [`Simulation`].

/// Field bindings: literals, expressions and choosers.
pub mod binding;
/// The chooser trait and the random-attribute chooser.
pub mod chooser;
/// Simulation clock for tracking ticks and timestamps.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Context passed to scheduling and resolution calls.
pub mod context;
/// Scheduling strategies and the emitter wrapper.
pub mod emitter;
/// Entity and event types and records.
pub mod entity;
/// Error types for the simulation crate.
pub mod error;
/// Mutation requests produced by emitters.
pub mod mutation;
/// JSON scenario files.
pub mod scenario;
/// Top-level simulation orchestrator.
pub mod simulation;
/// Registries of types, entities and events.
pub mod state;

/// Re-exports of [`binding::Binding`] and [`binding::Bindings`].
pub use binding::{Binding, Bindings};
/// Re-exports of [`chooser::Chooser`] and [`chooser::RandomAttributeChooser`].
pub use chooser::{Chooser, RandomAttributeChooser};
/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of the emitter types.
pub use emitter::{
    Emitter, GammaEmitter, IntervalEmitter, Offset, PoissonEmitter, Spacing, Strategy, Target,
};
/// Re-exports of the type declarations and records.
pub use entity::{Entity, EntityType, Event, EventType};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`mutation::MutationKind`] and [`mutation::MutationRequest`].
pub use mutation::{MutationKind, MutationRequest};
/// Re-export of [`scenario::Scenario`].
pub use scenario::Scenario;
/// Re-exports of [`simulation::Simulation`] and [`simulation::TickSummary`].
pub use simulation::{Simulation, TickSummary};
/// Re-export of [`state::SimState`].
pub use state::SimState;
