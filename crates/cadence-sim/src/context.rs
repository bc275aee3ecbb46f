use cadence_core::{EntityRef, EventRef, Value};
use cadence_expr::Scope;
use rand::rngs::StdRng;

use crate::state::SimState;

/// Read access to the simulation plus its single RNG, passed to every
/// scheduling and resolution call.
pub struct SimContext<'a> {
    /// Current registries and clock.
    pub state: &'a SimState,
    /// The simulation's RNG. Nothing else draws randomness.
    pub rng: &'a mut StdRng,
}

impl<'a> SimContext<'a> {
    /// Bundle state and RNG.
    pub fn new(state: &'a SimState, rng: &'a mut StdRng) -> Self {
        Self { state, rng }
    }
}

/// The `(sim, parent, timestamp)` triple an expression sees.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    state: &'a SimState,
    parent: &'a EntityRef,
    timestamp: i64,
}

impl<'a> Frame<'a> {
    /// Build a frame for one occurrence.
    pub fn new(state: &'a SimState, parent: &'a EntityRef, timestamp: i64) -> Self {
        Self {
            state,
            parent,
            timestamp,
        }
    }
}

impl Scope for Frame<'_> {
    fn sim_attr(&self, name: &str) -> Option<Value> {
        let clock = self.state.clock();
        let value = match name {
            "interval" => Value::Integer(clock.interval()),
            "timestamp" => Value::Integer(clock.now()),
            "prev_timestamp" => Value::Integer(clock.prev()),
            "step" => Value::Integer(i64::try_from(clock.step()).unwrap_or(i64::MAX)),
            "seed" => Value::Integer(i64::try_from(self.state.seed()).unwrap_or(i64::MAX)),
            _ => return None,
        };
        Some(value)
    }

    fn entities(&self, type_name: &str) -> Option<Vec<Value>> {
        self.state
            .entities_of(type_name)
            .map(|list| list.iter().map(|e| Value::Entity(e.id.clone())).collect())
    }

    fn events(&self, type_name: &str) -> Option<Vec<Value>> {
        self.state
            .events_of(type_name)
            .map(|list| list.iter().map(|e| Value::Event(e.id.clone())).collect())
    }

    fn parent(&self) -> Value {
        Value::Entity(self.parent.clone())
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn entity_attr(&self, entity: &EntityRef, name: &str) -> Option<Value> {
        self.state.entity(entity)?.fields.get(name).cloned()
    }

    fn event_attr(&self, event: &EventRef, name: &str) -> Option<Value> {
        let event = self.state.event(event)?;
        event.fields.get(name).cloned().or_else(|| match name {
            "timestamp" => Some(Value::Integer(event.timestamp)),
            "parent" => Some(Value::Entity(event.parent.clone())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_attrs_read_clock_and_seed() {
        let state = SimState::new(42, 1000, 60);
        let parent = EntityRef::new("Sensor", 0);
        let frame = Frame::new(&state, &parent, 1010);
        assert_eq!(frame.sim_attr("seed"), Some(Value::Integer(42)));
        assert_eq!(frame.sim_attr("interval"), Some(Value::Integer(60)));
        assert_eq!(frame.sim_attr("nope"), None);
        assert_eq!(frame.timestamp(), 1010);
    }

    #[test]
    fn large_seed_saturates_instead_of_wrapping() {
        let state = SimState::new(u64::MAX, 0, 60);
        let parent = EntityRef::new("Sensor", 0);
        let frame = Frame::new(&state, &parent, 0);
        assert_eq!(frame.sim_attr("seed"), Some(Value::Integer(i64::MAX)));
    }
}
