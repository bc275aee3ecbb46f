use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::{EntityRef, EventRef, Fields, TypeName};

use crate::clock::SimClock;
use crate::entity::{Entity, EntityType, Event, EventType};
use crate::error::{SimError, SimResult};

/// Everything an expression can observe: the clock, the type registries,
/// and the live entity and event lists.
///
/// Lists only grow during a tick. A failed tick truncates them back to a
/// [`Checkpoint`].
#[derive(Debug, Clone)]
pub struct SimState {
    clock: SimClock,
    seed: u64,
    entity_types: Vec<EntityType>,
    entity_index: HashMap<TypeName, usize>,
    entities: Vec<Vec<Entity>>,
    event_types: Vec<EventType>,
    event_index: HashMap<TypeName, usize>,
    events: Vec<Vec<Event>>,
}

/// Registry lengths and clock position at the start of a tick.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    clock: SimClock,
    entities: Vec<usize>,
    events: Vec<usize>,
}

impl SimState {
    /// Empty registries with a clock at `start`.
    pub fn new(seed: u64, start: i64, tick_interval: i64) -> Self {
        Self {
            clock: SimClock::new(start, tick_interval),
            seed,
            entity_types: Vec::new(),
            entity_index: HashMap::new(),
            entities: Vec::new(),
            event_types: Vec::new(),
            event_index: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// The simulation clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    /// The configured RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn register_entity_type(&mut self, ty: EntityType) -> SimResult<()> {
        if self.entity_index.contains_key(ty.name()) {
            return Err(SimError::DuplicateType {
                namespace: "entity",
                name: ty.name().to_string(),
            });
        }
        self.entity_index
            .insert(ty.name().clone(), self.entity_types.len());
        self.entity_types.push(ty);
        self.entities.push(Vec::new());
        Ok(())
    }

    pub(crate) fn register_event_type(&mut self, ty: EventType) -> SimResult<()> {
        if self.event_index.contains_key(ty.name()) {
            return Err(SimError::DuplicateType {
                namespace: "event",
                name: ty.name().to_string(),
            });
        }
        self.event_index
            .insert(ty.name().clone(), self.event_types.len());
        self.event_types.push(ty);
        self.events.push(Vec::new());
        Ok(())
    }

    /// Entity types in registration order.
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    /// Event types in registration order.
    pub fn event_types(&self) -> &[EventType] {
        &self.event_types
    }

    pub(crate) fn entity_type_index(&self, name: &str) -> Option<usize> {
        self.entity_index.get(name).copied()
    }

    pub(crate) fn event_type_index(&self, name: &str) -> Option<usize> {
        self.event_index.get(name).copied()
    }

    /// Look up an entity type by name.
    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_type_index(name).map(|i| &self.entity_types[i])
    }

    /// Look up an event type by name.
    pub fn event_type(&self, name: &str) -> Option<&EventType> {
        self.event_type_index(name).map(|i| &self.event_types[i])
    }

    /// Live entities of a type, in creation order.
    pub fn entities_of(&self, name: &str) -> Option<&[Entity]> {
        self.entity_type_index(name).map(|i| self.entities[i].as_slice())
    }

    /// Events of a type, in creation order.
    pub fn events_of(&self, name: &str) -> Option<&[Event]> {
        self.event_type_index(name).map(|i| self.events[i].as_slice())
    }

    /// Each entity type paired with its live entities.
    pub fn entity_groups(&self) -> impl Iterator<Item = (&EntityType, &[Entity])> {
        self.entity_types
            .iter()
            .zip(self.entities.iter().map(Vec::as_slice))
    }

    /// Each event type paired with its events.
    pub fn event_groups(&self) -> impl Iterator<Item = (&EventType, &[Event])> {
        self.event_types
            .iter()
            .zip(self.events.iter().map(Vec::as_slice))
    }

    /// Resolve an entity handle.
    pub fn entity(&self, id: &EntityRef) -> Option<&Entity> {
        self.entities_of(id.type_name.as_str())?.get(id.index)
    }

    /// Resolve an event handle.
    pub fn event(&self, id: &EventRef) -> Option<&Event> {
        self.events_of(id.type_name.as_str())?.get(id.index)
    }

    /// Total live entities across all types.
    pub fn entity_count(&self) -> usize {
        self.entities.iter().map(Vec::len).sum()
    }

    /// Total events across all types.
    pub fn event_count(&self) -> usize {
        self.events.iter().map(Vec::len).sum()
    }

    pub(crate) fn push_entity(
        &mut self,
        type_index: usize,
        fields: Fields,
        created_at: Option<i64>,
    ) -> EntityRef {
        let ty = &self.entity_types[type_index];
        let list = &mut self.entities[type_index];
        let id = EntityRef::new(ty.name().clone(), list.len());
        list.push(Entity::new(
            id.clone(),
            fields,
            created_at,
            ty.shared_emitters(),
        ));
        id
    }

    pub(crate) fn push_event(
        &mut self,
        type_index: usize,
        timestamp: i64,
        parent: EntityRef,
        fields: Fields,
    ) -> EventRef {
        let list = &mut self.events[type_index];
        let id = EventRef::new(self.event_types[type_index].name().clone(), list.len());
        list.push(Event {
            id: id.clone(),
            timestamp,
            parent,
            fields,
        });
        id
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            clock: self.clock,
            entities: self.entities.iter().map(Vec::len).collect(),
            events: self.events.iter().map(Vec::len).collect(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: &Checkpoint) {
        self.clock = checkpoint.clock;
        for (list, len) in self.entities.iter_mut().zip(&checkpoint.entities) {
            list.truncate(*len);
        }
        for (list, len) in self.events.iter_mut().zip(&checkpoint.events) {
            list.truncate(*len);
        }
    }
}
