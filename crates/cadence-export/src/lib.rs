//! Reports and dataset export for Cadence simulations.
//!
//! Reads a finished [`cadence_sim::SimState`] and renders a count summary,
//! SQL DDL, an SQL insert script, or a JSON document.

/// Error types for the export crate.
pub mod error;
/// JSON export.
pub mod json;
/// Per-type count summary.
pub mod report;
/// Table derivation and DDL.
pub mod schema;
/// SQL script export.
pub mod sql;

use std::fmt;
use std::str::FromStr;

use cadence_sim::SimState;

/// Re-exports of [`error::ExportError`] and [`error::ExportResult`].
pub use error::{ExportError, ExportResult};
/// Re-export of [`report::Report`].
pub use report::Report;
/// Re-exports of the schema types.
pub use schema::{SqlType, TableSchema};

/// Dataset export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// DDL plus inserts.
    Sql,
    /// One JSON document.
    Json,
}

impl FromStr for Format {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql => write!(f, "sql"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Render `state` in `format`.
pub fn export(name: &str, state: &SimState, format: Format) -> ExportResult<String> {
    match format {
        Format::Sql => sql::script(state),
        Format::Json => json::to_string(name, state),
    }
}

/// `CREATE TABLE` statements for every exported table, blank-line separated.
pub fn ddl(state: &SimState) -> ExportResult<String> {
    let statements: Vec<String> = schema::derive(state)?
        .iter()
        .map(TableSchema::create_statement)
        .collect();
    Ok(statements.join("\n\n"))
}

#[cfg(test)]
mod test_support {
    use cadence_core::{FieldDef, FieldKind, Fields, Value};
    use cadence_sim::{
        Bindings, Emitter, EntityType, EventType, IntervalEmitter, Offset, SimConfig, SimState,
        Simulation, Target,
    };

    /// One customer placing an order at the start of every 60-unit tick and
    /// a refund 30 units later, run for two ticks.
    pub(crate) fn shop() -> SimState {
        let mut sim = Simulation::new(SimConfig::default().with_tick_interval(60)).unwrap();
        sim.add_event_type(
            EventType::new("Order")
                .with_table("activity")
                .with_field(FieldDef::new("total", FieldKind::Float))
                .unwrap(),
        )
        .unwrap();
        sim.add_event_type(
            EventType::new("Refund")
                .with_table("activity")
                .with_field(FieldDef::new("total", FieldKind::Float))
                .unwrap()
                .with_field(FieldDef::new("reason", FieldKind::Text))
                .unwrap(),
        )
        .unwrap();

        let order = Emitter::new("order", Target::Event("Order".into()), IntervalEmitter::new())
            .with_bindings(Bindings::new().with("total", Value::Float(12.5)));
        let refund = Emitter::new(
            "refund",
            Target::Event("Refund".into()),
            IntervalEmitter::new().with_offset(Offset::Constant(30)),
        )
        .with_bindings(
            Bindings::new()
                .with("total", Value::Integer(-2))
                .with("reason", Value::from("late")),
        );

        let mut customer = Fields::new();
        customer.insert("name".into(), Value::from("o'neil"));
        sim.add_entity_type(
            EntityType::new("Customer")
                .with_table("customers")
                .with_field(FieldDef::new("name", FieldKind::Text))
                .unwrap()
                .with_instance(customer)
                .with_emitter(order)
                .with_emitter(refund),
        )
        .unwrap();
        sim.add_entity_type(EntityType::new("Store")).unwrap();

        sim.run(2).unwrap();
        sim.into_state()
    }
}
