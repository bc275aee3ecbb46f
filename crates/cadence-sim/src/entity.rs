use std::sync::Arc;

use cadence_core::{EntityRef, EventRef, FieldDef, FieldSet, Fields, TypeName};
use serde::Serialize;

use crate::context::SimContext;
use crate::emitter::Emitter;
use crate::error::SimResult;
use crate::mutation::MutationRequest;

/// Declaration of an entity type: its fields, its emitters, and the
/// instances present before the first tick.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: TypeName,
    table: Option<String>,
    fields: FieldSet,
    emitters: Arc<[Emitter]>,
    instances: Option<Vec<Fields>>,
}

impl EntityType {
    /// Declare an entity type with no fields, emitters, or table.
    pub fn new(name: impl Into<TypeName>) -> Self {
        let name = name.into();
        Self {
            fields: FieldSet::new(name.as_str()),
            name,
            table: None,
            emitters: Arc::from(Vec::new()),
            instances: None,
        }
    }

    /// Export instances of this type to `table`. Types without a table are
    /// simulated but not exported.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare a field.
    pub fn with_field(mut self, def: FieldDef) -> SimResult<Self> {
        self.fields.push(def)?;
        Ok(self)
    }

    /// Attach an emitter. Emitters run in the order they are attached.
    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        let mut emitters = self.emitters.to_vec();
        emitters.push(emitter);
        self.emitters = Arc::from(emitters);
        self
    }

    /// Add a seed instance. Without any, the type starts with exactly one
    /// instance built from field defaults.
    pub fn with_instance(mut self, fields: Fields) -> Self {
        self.instances.get_or_insert_with(Vec::new).push(fields);
        self
    }

    /// Replace the seed instances. An empty list starts the type with none.
    pub fn with_instances(mut self, instances: Vec<Fields>) -> Self {
        self.instances = Some(instances);
        self
    }

    /// The registered name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Export table, if any.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Field declarations.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Emitters, in declaration order.
    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub(crate) fn shared_emitters(&self) -> Arc<[Emitter]> {
        Arc::clone(&self.emitters)
    }

    /// Seed instances as declared. `None` means one default instance.
    pub fn instances(&self) -> Option<&[Fields]> {
        self.instances.as_deref()
    }
}

/// Declaration of an event type.
#[derive(Debug, Clone)]
pub struct EventType {
    name: TypeName,
    table: Option<String>,
    fields: FieldSet,
}

impl EventType {
    /// Declare an event type with no fields. Its table defaults to its name.
    pub fn new(name: impl Into<TypeName>) -> Self {
        let name = name.into();
        Self {
            fields: FieldSet::new(name.as_str()),
            name,
            table: None,
        }
    }

    /// Export events of this type to `table`. Several event types may share
    /// a table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare a field.
    pub fn with_field(mut self, def: FieldDef) -> SimResult<Self> {
        self.fields.push(def)?;
        Ok(self)
    }

    /// The registered name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Export table.
    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(self.name.as_str())
    }

    /// Field declarations.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }
}

/// A live entity.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    /// Type name and live-list position.
    pub id: EntityRef,
    /// Resolved field values.
    pub fields: Fields,
    /// Timestamp of the mutation that created it; `None` for seed instances.
    pub created_at: Option<i64>,
    #[serde(skip)]
    emitters: Arc<[Emitter]>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityRef,
        fields: Fields,
        created_at: Option<i64>,
        emitters: Arc<[Emitter]>,
    ) -> Self {
        Self {
            id,
            fields,
            created_at,
            emitters,
        }
    }

    /// The entity's emitters, shared with its type.
    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    /// Ask every emitter, in declaration order, for the occurrences in
    /// `[prev, tick)`.
    pub fn update(
        &self,
        ctx: &mut SimContext<'_>,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<MutationRequest>> {
        let mut requests = Vec::new();
        for emitter in self.emitters.iter() {
            requests.extend(emitter.emit(ctx, &self.id, prev, tick)?);
        }
        Ok(requests)
    }
}

/// A materialized event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Type name and position within that type's registry.
    pub id: EventRef,
    /// When the event occurred.
    pub timestamp: i64,
    /// The entity whose emitter produced it.
    pub parent: EntityRef,
    /// Resolved field values.
    pub fields: Fields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{FieldKind, Value};

    #[test]
    fn event_table_defaults_to_name() {
        let plain = EventType::new("Purchase");
        assert_eq!(plain.table(), "Purchase");
        let shared = EventType::new("Refund").with_table("transactions");
        assert_eq!(shared.table(), "transactions");
    }

    #[test]
    fn entity_type_builder() {
        let mut seed = Fields::new();
        seed.insert("name".into(), Value::from("alice"));
        let ty = EntityType::new("Customer")
            .with_table("customers")
            .with_field(FieldDef::new("name", FieldKind::Text))
            .unwrap()
            .with_instance(seed);
        assert_eq!(ty.name().as_str(), "Customer");
        assert_eq!(ty.table(), Some("customers"));
        assert_eq!(ty.fields().len(), 1);
        assert_eq!(ty.instances().map(<[Fields]>::len), Some(1));
        assert!(ty.emitters().is_empty());
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let result = EventType::new("Purchase")
            .with_field(FieldDef::new("amount", FieldKind::Float))
            .and_then(|t| t.with_field(FieldDef::new("amount", FieldKind::Integer)));
        assert!(result.is_err());
    }

    #[test]
    fn empty_instance_list_is_explicit() {
        let ty = EntityType::new("Store").with_instances(Vec::new());
        assert_eq!(ty.instances().map(<[Fields]>::len), Some(0));
        assert!(EntityType::new("Store").instances().is_none());
    }
}
