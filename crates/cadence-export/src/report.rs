use std::fmt;

use cadence_sim::SimState;
use serde::Serialize;

/// Record count of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    /// Type name.
    pub name: String,
    /// Number of records.
    pub count: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Scenario name.
    pub name: String,
    /// Completed ticks.
    pub steps: u64,
    /// Clock value after the last tick.
    pub timestamp: i64,
    /// Live entities per type, in registration order.
    pub entities: Vec<TypeCount>,
    /// Events per type, in registration order.
    pub events: Vec<TypeCount>,
}

impl Report {
    /// Summarize `state`.
    pub fn new(name: impl Into<String>, state: &SimState) -> Self {
        Self {
            name: name.into(),
            steps: state.clock().step(),
            timestamp: state.clock().now(),
            entities: state
                .entity_groups()
                .map(|(ty, list)| TypeCount {
                    name: ty.name().to_string(),
                    count: list.len(),
                })
                .collect(),
            events: state
                .event_groups()
                .map(|(ty, list)| TypeCount {
                    name: ty.name().to_string(),
                    count: list.len(),
                })
                .collect(),
        }
    }

    /// Total live entities.
    pub fn entity_total(&self) -> usize {
        self.entities.iter().map(|c| c.count).sum()
    }

    /// Total events.
    pub fn event_total(&self) -> usize {
        self.events.iter().map(|c| c.count).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Entities ===")?;
        for count in &self.entities {
            writeln!(f, "  {}: {}", count.name, count.count)?;
        }
        writeln!(f)?;
        writeln!(f, "=== Events ===")?;
        for count in &self.events {
            writeln!(f, "  {}: {}", count.name, count.count)?;
        }
        Ok(())
    }
}
