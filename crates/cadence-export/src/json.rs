use cadence_sim::SimState;
use serde_json::{Map, json};

use crate::error::ExportResult;

/// The registries as one JSON document, grouped by type in registration
/// order.
pub fn document(name: &str, state: &SimState) -> ExportResult<serde_json::Value> {
    let mut entities = Map::new();
    for (ty, list) in state.entity_groups() {
        entities.insert(ty.name().to_string(), serde_json::to_value(list)?);
    }
    let mut events = Map::new();
    for (ty, list) in state.event_groups() {
        events.insert(ty.name().to_string(), serde_json::to_value(list)?);
    }

    Ok(json!({
        "scenario": name,
        "steps": state.clock().step(),
        "timestamp": state.clock().now(),
        "entities": entities,
        "events": events,
    }))
}

/// Pretty-printed [`document`].
pub fn to_string(name: &str, state: &SimState) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(&document(name, state)?)?)
}
