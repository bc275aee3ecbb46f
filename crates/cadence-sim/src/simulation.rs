use cadence_core::{FieldSet, Fields};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::emitter::Target;
use crate::entity::{EntityType, EventType};
use crate::error::{SimError, SimResult};
use crate::mutation::{MutationKind, MutationRequest};
use crate::state::SimState;

/// Counts for one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick's step number, starting at 1.
    pub step: u64,
    /// Start of the tick's window.
    pub prev: i64,
    /// End of the tick's window.
    pub now: i64,
    /// Events appended.
    pub events_added: usize,
    /// Entities appended.
    pub entities_added: usize,
}

/// The top-level simulation orchestrator.
///
/// Owns the registries, clock, and RNG. Each tick advances the clock,
/// collects mutation requests from every entity that existed when the tick
/// started, then applies them in collection order.
pub struct Simulation {
    state: SimState,
    rng: StdRng,
    config: SimConfig,
    initialized: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("step", &self.state.clock().step())
            .field("entities", &self.state.entity_count())
            .field("events", &self.state.event_count())
            .finish()
    }
}

impl Simulation {
    /// Create an empty simulation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            state: SimState::new(config.seed, config.start_timestamp, config.tick_interval),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            initialized: false,
        })
    }

    /// Register an event type. Types must be registered before the first tick.
    pub fn add_event_type(&mut self, ty: EventType) -> SimResult<()> {
        self.ensure_not_started(ty.name().as_str())?;
        self.state.register_event_type(ty)
    }

    /// Register an entity type. Entity types are updated in registration
    /// order.
    pub fn add_entity_type(&mut self, ty: EntityType) -> SimResult<()> {
        self.ensure_not_started(ty.name().as_str())?;
        self.state.register_entity_type(ty)
    }

    fn ensure_not_started(&self, name: &str) -> SimResult<()> {
        if self.initialized {
            return Err(SimError::Config(format!(
                "cannot register `{name}` after the simulation has started"
            )));
        }
        Ok(())
    }

    /// Validate emitter targets and bindings, then create seed instances.
    /// Called by the first [`Simulation::tick`] if not called explicitly.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.validate()?;

        let checkpoint = self.state.checkpoint();
        if let Err(err) = self.create_seed_instances() {
            self.state.restore(&checkpoint);
            return Err(err);
        }

        self.initialized = true;
        info!(
            entity_types = self.state.entity_types().len(),
            event_types = self.state.event_types().len(),
            entities = self.state.entity_count(),
            "simulation initialized"
        );
        Ok(())
    }

    fn validate(&self) -> SimResult<()> {
        for ty in self.state.entity_types() {
            for emitter in ty.emitters() {
                let fields = match emitter.target() {
                    Target::Event(name) => self
                        .state
                        .event_type(name.as_str())
                        .map(EventType::fields)
                        .ok_or_else(|| SimError::UnknownEventType(name.to_string()))?,
                    Target::Entity(name) => self
                        .state
                        .entity_type(name.as_str())
                        .map(EntityType::fields)
                        .ok_or_else(|| SimError::UnknownEntityType(name.to_string()))?,
                };
                fields.check_names(emitter.bindings().names())?;
            }
        }
        Ok(())
    }

    fn create_seed_instances(&mut self) -> SimResult<()> {
        for index in 0..self.state.entity_types().len() {
            let ty = &self.state.entity_types()[index];
            let seeds = match ty.instances() {
                Some(seeds) => seeds.to_vec(),
                None => vec![Fields::new()],
            };
            let built = seeds
                .into_iter()
                .map(|seed| ty.fields().build(seed))
                .collect::<Result<Vec<_>, _>>()?;
            for fields in built {
                self.state.push_entity(index, fields, None);
            }
        }
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// A tick is atomic: if any request fails to resolve or instantiate, the
    /// registries, clock and RNG are restored to their state before the tick
    /// and the error is returned.
    pub fn tick(&mut self) -> SimResult<TickSummary> {
        self.init()?;

        let checkpoint = self.state.checkpoint();
        let rng = self.rng.clone();
        match self.step() {
            Ok(summary) => {
                debug!(
                    step = summary.step,
                    prev = summary.prev,
                    now = summary.now,
                    events = summary.events_added,
                    entities = summary.entities_added,
                    "tick complete"
                );
                Ok(summary)
            }
            Err(err) => {
                self.state.restore(&checkpoint);
                self.rng = rng;
                warn!(
                    step = self.state.clock().step() + 1,
                    error = %err,
                    "tick failed, state rolled back"
                );
                Err(err)
            }
        }
    }

    fn step(&mut self) -> SimResult<TickSummary> {
        let (prev, now) = self.state.clock_mut().advance();
        let requests = self.collect(prev, now)?;

        let mut summary = TickSummary {
            step: self.state.clock().step(),
            prev,
            now,
            ..TickSummary::default()
        };
        for request in &requests {
            match self.apply(request)? {
                MutationKind::AddEvent => summary.events_added += 1,
                MutationKind::AddEntity => summary.entities_added += 1,
            }
        }
        Ok(summary)
    }

    /// Requests from every entity, in type registration order, then entity
    /// order, then emitter order.
    fn collect(&mut self, prev: i64, now: i64) -> SimResult<Vec<MutationRequest>> {
        let state = &self.state;
        let mut ctx = SimContext::new(state, &mut self.rng);
        let mut requests = Vec::new();
        for (_, entities) in state.entity_groups() {
            for entity in entities {
                requests.extend(entity.update(&mut ctx, prev, now)?);
            }
        }
        Ok(requests)
    }

    fn apply(&mut self, request: &MutationRequest) -> SimResult<MutationKind> {
        let name = request.type_name.as_str();
        match request.kind {
            MutationKind::AddEvent => {
                let index = self
                    .state
                    .event_type_index(name)
                    .ok_or_else(|| SimError::UnknownEventType(name.to_string()))?;
                let fields = resolve_fields(
                    &self.state,
                    &mut self.rng,
                    request,
                    self.state.event_types()[index].fields(),
                )?;
                let id =
                    self.state
                        .push_event(index, request.timestamp, request.parent.clone(), fields);
                trace!(%id, timestamp = request.timestamp, parent = %request.parent, "event added");
            }
            MutationKind::AddEntity => {
                let index = self
                    .state
                    .entity_type_index(name)
                    .ok_or_else(|| SimError::UnknownEntityType(name.to_string()))?;
                let fields = resolve_fields(
                    &self.state,
                    &mut self.rng,
                    request,
                    self.state.entity_types()[index].fields(),
                )?;
                let id = self
                    .state
                    .push_entity(index, fields, Some(request.timestamp));
                trace!(%id, timestamp = request.timestamp, parent = %request.parent, "entity added");
            }
        }
        Ok(request.kind)
    }

    /// Advance the simulation by `steps` ticks, stopping at the first error.
    pub fn run(&mut self, steps: u64) -> SimResult<()> {
        self.init()?;
        info!(steps, seed = self.config.seed, "simulation run started");
        for _ in 0..steps {
            self.tick()?;
        }
        info!(
            step = self.current_step(),
            entities = self.state.entity_count(),
            events = self.state.event_count(),
            "simulation run finished"
        );
        Ok(())
    }

    /// Registries and clock.
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// The simulation clock.
    pub fn clock(&self) -> &SimClock {
        self.state.clock()
    }

    /// The configuration the simulation was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of completed ticks.
    pub fn current_step(&self) -> u64 {
        self.state.clock().step()
    }

    /// Extract the registries, consuming the simulation.
    pub fn into_state(self) -> SimState {
        self.state
    }
}

fn resolve_fields(
    state: &SimState,
    rng: &mut StdRng,
    request: &MutationRequest,
    fields: &FieldSet,
) -> SimResult<Fields> {
    let mut ctx = SimContext::new(state, rng);
    let supplied = request.bindings.resolve_all(
        &mut ctx,
        &request.parent,
        request.timestamp,
        request.type_name.as_str(),
    )?;
    Ok(fields.build(supplied)?)
}
