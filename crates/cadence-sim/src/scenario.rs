//! JSON scenario files: type declarations, seed instances, emitters and run
//! settings in one document.
//!
//! ```json
//! {
//!   "name": "shop",
//!   "seed": 7,
//!   "steps": 24,
//!   "event_types": [
//!     { "name": "Purchase", "fields": [{ "name": "amount", "kind": "float" }] }
//!   ],
//!   "entity_types": [{
//!     "name": "Customer",
//!     "instances": [{}, {}],
//!     "emitters": [{
//!       "name": "buy",
//!       "event": "Purchase",
//!       "schedule": { "type": "poisson", "rate": 2, "time_interval": 3600 },
//!       "fields": { "amount": "timestamp % 100 + 0.99" }
//!     }]
//!   }]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use cadence_core::{FieldDef, Fields, Value};
use cadence_expr::Expression;
use serde::Deserialize;

use crate::binding::{Binding, Bindings};
use crate::chooser::RandomAttributeChooser;
use crate::config::SimConfig;
use crate::emitter::{
    Emitter, GammaEmitter, IntervalEmitter, Offset, PoissonEmitter, Spacing, Strategy, Target,
};
use crate::entity::{EntityType, EventType};
use crate::error::{SimError, SimResult};
use crate::simulation::Simulation;

/// A complete scenario document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Display name.
    pub name: String,
    /// RNG seed. Defaults to [`SimConfig::default`]'s.
    pub seed: Option<u64>,
    /// Time units per tick.
    pub tick_interval: Option<i64>,
    /// Clock value before the first tick.
    pub start_timestamp: Option<i64>,
    /// Suggested number of ticks.
    pub steps: Option<u64>,
    /// Event type declarations.
    #[serde(default)]
    pub event_types: Vec<EventTypeSpec>,
    /// Entity type declarations, in update order.
    #[serde(default)]
    pub entity_types: Vec<EntityTypeSpec>,
}

/// An event type declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventTypeSpec {
    /// Type name.
    pub name: String,
    /// Export table. Defaults to the type name.
    pub table: Option<String>,
    /// Field declarations.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// An entity type declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityTypeSpec {
    /// Type name.
    pub name: String,
    /// Export table. Entity types without one are not exported.
    pub table: Option<String>,
    /// Field declarations.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Seed instances. Omitted means one instance built from defaults.
    pub instances: Option<Vec<Fields>>,
    /// Emitters, in evaluation order.
    #[serde(default)]
    pub emitters: Vec<EmitterSpec>,
}

/// An emitter declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitterSpec {
    /// Name, unique within the owning entity type.
    pub name: String,
    /// Event type to create.
    pub event: Option<String>,
    /// Entity type to create.
    pub entity: Option<String>,
    /// Scheduling strategy.
    pub schedule: ScheduleSpec,
    /// Field bindings in declaration order. Values follow [`BindingSpec`].
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Scheduling strategy and its parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleSpec {
    /// Regular grid.
    Interval {
        /// Grid interval binding. Defaults to `sim.interval`.
        interval: Option<BindingSpec>,
        /// Slot spacing.
        #[serde(default)]
        spacing: Spacing,
        /// Offsets, summed.
        #[serde(default)]
        offsets: Vec<OffsetSpec>,
        /// Per-candidate drop probability.
        #[serde(default)]
        skip_probability: f64,
    },
    /// Poisson arrivals.
    Poisson {
        /// Events per `time_interval`.
        rate: f64,
        /// Time units the rate refers to.
        #[serde(default = "unit_interval")]
        time_interval: f64,
    },
    /// Gamma-distributed gaps.
    Gamma {
        /// Shape parameter.
        shape: f64,
        /// Scale parameter.
        scale: f64,
    },
}

fn unit_interval() -> f64 {
    1.0
}

/// A timestamp offset declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OffsetSpec {
    /// Fixed shift.
    Constant {
        /// The shift.
        value: i64,
    },
    /// Normal draw.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        sd: f64,
    },
    /// Uniform integer draw.
    Uniform {
        /// Inclusive lower bound.
        low: i64,
        /// Inclusive upper bound.
        high: i64,
    },
    /// Exponential draw.
    Exponential {
        /// Rate.
        lambda: f64,
    },
}

/// A binding in a scenario file.
///
/// A string is an expression and any other scalar a literal. Objects force
/// the interpretation: `{"literal": ...}` or
/// `{"choose": {"from": "...", "attribute": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BindingSpec {
    /// `{"literal": value}`.
    Literal(LiteralSpec),
    /// `{"choose": {...}}`.
    Choose(ChooseSpec),
    /// Expression text.
    Expression(String),
    /// Number, boolean, null or list.
    Scalar(Value),
}

/// Body of a forced literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteralSpec {
    /// The value, stored unchanged.
    pub literal: Value,
}

/// Wrapper of a chooser binding.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChooseSpec {
    /// The chooser's parameters.
    pub choose: ChoiceSpec,
}

/// Parameters of a random-attribute chooser.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceSpec {
    /// Expression producing the list to pick from.
    pub from: String,
    /// Attribute read from the pick.
    pub attribute: Option<String>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    pub fn from_json(text: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a scenario file.
    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The scenario's run settings over the defaults.
    pub fn config(&self) -> SimConfig {
        let mut config = SimConfig::default();
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(interval) = self.tick_interval {
            config = config.with_tick_interval(interval);
        }
        if let Some(start) = self.start_timestamp {
            config = config.with_start_timestamp(start);
        }
        config
    }

    /// Register every declared type on a new simulation.
    pub fn build(&self, config: SimConfig) -> SimResult<Simulation> {
        let mut sim = Simulation::new(config)?;
        for spec in &self.event_types {
            sim.add_event_type(spec.to_type()?)?;
        }
        for spec in &self.entity_types {
            sim.add_entity_type(spec.to_type()?)?;
        }
        Ok(sim)
    }
}

impl EventTypeSpec {
    /// Convert into an [`EventType`].
    pub fn to_type(&self) -> SimResult<EventType> {
        let mut ty = EventType::new(self.name.as_str());
        if let Some(table) = &self.table {
            ty = ty.with_table(table.as_str());
        }
        for def in &self.fields {
            ty = ty.with_field(def.clone())?;
        }
        Ok(ty)
    }
}

impl EntityTypeSpec {
    /// Convert into an [`EntityType`], building every emitter.
    pub fn to_type(&self) -> SimResult<EntityType> {
        let mut ty = EntityType::new(self.name.as_str());
        if let Some(table) = &self.table {
            ty = ty.with_table(table.as_str());
        }
        for def in &self.fields {
            ty = ty.with_field(def.clone())?;
        }
        if let Some(instances) = &self.instances {
            ty = ty.with_instances(instances.clone());
        }

        let mut seen = HashSet::new();
        for spec in &self.emitters {
            if !seen.insert(spec.name.as_str()) {
                return Err(SimError::Config(format!(
                    "{} declares emitter `{}` more than once",
                    self.name, spec.name
                )));
            }
            ty = ty.with_emitter(spec.to_emitter()?);
        }
        Ok(ty)
    }
}

impl EmitterSpec {
    /// Convert into an [`Emitter`].
    pub fn to_emitter(&self) -> SimResult<Emitter> {
        let target = Target::from_names(&self.name, self.event.as_deref(), self.entity.as_deref())?;
        let strategy = self.schedule.to_strategy()?;

        let mut bindings = Bindings::new();
        for (field, raw) in &self.fields {
            let label = format!("{}.{field}", target.type_name());
            let spec: BindingSpec = serde_json::from_value(raw.clone())?;
            let binding = spec.to_binding().map_err(|e| e.resolving(label))?;
            bindings.insert(field.as_str(), binding);
        }
        Ok(Emitter::new(self.name.as_str(), target, strategy).with_bindings(bindings))
    }
}

impl ScheduleSpec {
    /// Convert into a validated [`Strategy`].
    pub fn to_strategy(&self) -> SimResult<Strategy> {
        match self {
            Self::Interval {
                interval,
                spacing,
                offsets,
                skip_probability,
            } => {
                let mut emitter = IntervalEmitter::new()
                    .with_spacing(*spacing)
                    .with_skip_probability(*skip_probability)?;
                if let Some(interval) = interval {
                    emitter = emitter.with_interval(interval.to_binding()?);
                }
                for offset in offsets {
                    emitter = emitter.with_offset(offset.to_offset()?);
                }
                Ok(emitter.into())
            }
            Self::Poisson {
                rate,
                time_interval,
            } => Ok(PoissonEmitter::new(*rate)?
                .with_time_interval(*time_interval)?
                .into()),
            Self::Gamma { shape, scale } => Ok(GammaEmitter::new(*shape, *scale)?.into()),
        }
    }
}

impl OffsetSpec {
    /// Convert into a validated [`Offset`].
    pub fn to_offset(&self) -> SimResult<Offset> {
        match *self {
            Self::Constant { value } => Ok(Offset::Constant(value)),
            Self::Normal { mean, sd } => Offset::normal(mean, sd),
            Self::Uniform { low, high } => Offset::uniform(low, high),
            Self::Exponential { lambda } => Offset::exponential(lambda),
        }
    }
}

impl BindingSpec {
    /// Convert into a [`Binding`], parsing any expression text.
    pub fn to_binding(&self) -> SimResult<Binding> {
        match self {
            Self::Literal(spec) => Ok(Binding::literal(spec.literal.clone())),
            Self::Scalar(value) => Ok(Binding::literal(value.clone())),
            Self::Expression(text) => Binding::expression(text),
            Self::Choose(spec) => {
                let mut chooser = RandomAttributeChooser::new(Expression::parse(&spec.choose.from)?);
                if let Some(attribute) = &spec.choose.attribute {
                    chooser = chooser.with_attribute(attribute.as_str());
                }
                Ok(Binding::chooser(chooser))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_expr::ExprError;

    const SHOP: &str = r#"{
        "name": "shop",
        "seed": 7,
        "tick_interval": 600,
        "steps": 6,
        "event_types": [
            {
                "name": "Purchase",
                "table": "purchases",
                "fields": [
                    { "name": "product", "kind": "text" },
                    { "name": "price", "kind": "float" },
                    { "name": "channel", "kind": "text", "default": "web" },
                    { "name": "note", "kind": "text" }
                ]
            }
        ],
        "entity_types": [
            {
                "name": "Product",
                "fields": [
                    { "name": "title", "kind": "text" },
                    { "name": "price", "kind": "float" }
                ],
                "instances": [
                    { "title": "lamp", "price": 30.0 },
                    { "title": "desk", "price": 120.0 }
                ]
            },
            {
                "name": "Customer",
                "table": "customers",
                "fields": [{ "name": "name", "kind": "text", "default": "anon" }],
                "instances": [{ "name": "ada" }, {}],
                "emitters": [
                    {
                        "name": "buy",
                        "event": "Purchase",
                        "schedule": {
                            "type": "interval",
                            "interval": 300,
                            "offsets": [{ "type": "constant", "value": 5 }]
                        },
                        "fields": {
                            "product": { "choose": { "from": "sim.entities.Product", "attribute": "title" } },
                            "price": 9.5,
                            "note": { "literal": "parent.name" }
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn shop_scenario_runs() {
        let scenario = Scenario::from_json(SHOP).unwrap();
        let config = scenario.config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.tick_interval, 600);
        assert_eq!(scenario.steps, Some(6));

        let mut sim = scenario.build(config).unwrap();
        sim.run(scenario.steps.unwrap()).unwrap();

        let customers = sim.state().entities_of("Customer").unwrap();
        assert_eq!(customers[1].fields["name"], Value::from("anon"));

        // 2 customers * 2 slots per tick * 6 ticks.
        let purchases = sim.state().events_of("Purchase").unwrap();
        assert_eq!(purchases.len(), 24);
        for p in purchases {
            assert_eq!(p.timestamp % 300, 5);
            assert_eq!(p.fields["price"], Value::Float(9.5));
            assert_eq!(p.fields["channel"], Value::from("web"));
            assert_eq!(p.fields["note"], Value::from("parent.name"));
            let product = p.fields["product"].as_str().unwrap();
            assert!(product == "lamp" || product == "desk");
        }
        assert_eq!(sim.state().event_type("Purchase").unwrap().table(), "purchases");
    }

    #[test]
    fn field_bindings_keep_declaration_order() {
        let scenario = Scenario::from_json(SHOP).unwrap();
        let emitter = scenario.entity_types[1].emitters[0].to_emitter().unwrap();
        assert_eq!(
            emitter.bindings().names().collect::<Vec<_>>(),
            vec!["product", "price", "note"]
        );
    }

    #[test]
    fn defaults_when_settings_omitted() {
        let scenario = Scenario::from_json(r#"{ "name": "empty" }"#).unwrap();
        assert_eq!(scenario.config(), SimConfig::default());
        assert!(scenario.steps.is_none());
        let mut sim = scenario.build(scenario.config()).unwrap();
        sim.run(3).unwrap();
        assert_eq!(sim.current_step(), 3);
    }

    fn emitter(json: &str) -> SimResult<Emitter> {
        let spec: EmitterSpec = serde_json::from_str(json)?;
        spec.to_emitter()
    }

    #[test]
    fn schedule_variants_parse() {
        let poisson = emitter(
            r#"{ "name": "p", "event": "E", "schedule": { "type": "poisson", "rate": 3 } }"#,
        )
        .unwrap();
        assert!(matches!(poisson.strategy(), Strategy::Poisson(p) if p.time_interval() == 1.0));

        let gamma = emitter(
            r#"{ "name": "g", "entity": "E", "schedule": { "type": "gamma", "shape": 2, "scale": 50 } }"#,
        )
        .unwrap();
        assert!(matches!(gamma.strategy(), Strategy::Gamma(_)));
        assert_eq!(gamma.target(), &Target::Entity("E".into()));

        let interval = emitter(
            r#"{ "name": "i", "event": "E", "schedule": {
                "type": "interval", "spacing": "uniform", "skip_probability": 0.25,
                "offsets": [{ "type": "normal", "mean": 0, "sd": 10 }, { "type": "exponential", "lambda": 0.5 }]
            } }"#,
        )
        .unwrap();
        assert!(matches!(interval.strategy(), Strategy::Interval(_)));
    }

    #[test]
    fn target_must_be_exactly_one() {
        let both = emitter(
            r#"{ "name": "x", "event": "E", "entity": "F", "schedule": { "type": "gamma", "shape": 1, "scale": 1 } }"#,
        );
        assert!(matches!(both, Err(SimError::AmbiguousTarget { .. })));
        let neither =
            emitter(r#"{ "name": "x", "schedule": { "type": "gamma", "shape": 1, "scale": 1 } }"#);
        assert!(matches!(neither, Err(SimError::MissingTarget { .. })));
    }

    #[test]
    fn invalid_parameters_reported() {
        let err = emitter(
            r#"{ "name": "x", "event": "E", "schedule": { "type": "poisson", "rate": -1 } }"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "poisson emitter: invalid rate: must be finite and non-negative, got -1"
        );
        let err = emitter(
            r#"{ "name": "x", "event": "E", "schedule": { "type": "interval", "skip_probability": 2 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SimError::Distribution {
                parameter: "skip_probability",
                ..
            }
        ));
    }

    #[test]
    fn expression_syntax_errors_name_the_field() {
        let err = emitter(
            r#"{ "name": "x", "event": "Order", "schedule": { "type": "gamma", "shape": 1, "scale": 1 },
                 "fields": { "total": "parent.price *" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("cannot resolve `Order.total`"));
        assert!(matches!(err.root_cause(), SimError::Expr(ExprError::Syntax { .. })));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            Scenario::from_json(r#"{ "name": "x", "sead": 1 }"#),
            Err(SimError::Scenario(_))
        ));
        let err = emitter(
            r#"{ "name": "x", "event": "E", "schedule": { "type": "gamma", "shape": 1, "scale": 1 },
                 "fields": { "f": { "literal": 1, "extra": 2 } } }"#,
        );
        assert!(matches!(err, Err(SimError::Scenario(_))));
        let err = emitter(r#"{ "name": "x", "event": "E", "schedule": { "type": "weekly" } }"#);
        assert!(matches!(err, Err(SimError::Scenario(_))));
    }

    #[test]
    fn duplicate_emitter_names_rejected() {
        let spec: EntityTypeSpec = serde_json::from_str(
            r#"{ "name": "A", "emitters": [
                { "name": "e", "event": "E", "schedule": { "type": "gamma", "shape": 1, "scale": 1 } },
                { "name": "e", "event": "E", "schedule": { "type": "gamma", "shape": 1, "scale": 1 } }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(spec.to_type(), Err(SimError::Config(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Scenario::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
        assert!(err.to_string().starts_with("cannot read /definitely/not/here.json"));
    }
}
