use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// Resolved field values of one entity or event, keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// The declared kind of a field. Drives validation at instantiation time
/// and column types at export time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers. Integers are widened on assignment.
    Float,
    /// Text.
    Text,
    /// `true` / `false`.
    Boolean,
    /// Any value, including lists and object handles.
    #[default]
    Any,
}

impl FieldKind {
    /// Convert `value` into a value storable in a field of this kind.
    ///
    /// `Null` is accepted by every kind.
    pub fn coerce(self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Any, v) => Ok(v),
            (Self::Integer, Value::Integer(n)) => Ok(Value::Integer(n)),
            (Self::Integer, v @ Value::Float(_)) => match v.as_integer() {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(v),
            },
            (Self::Float, Value::Integer(n)) => Ok(Value::Float(n as f64)),
            (Self::Float, Value::Float(x)) => Ok(Value::Float(x)),
            (Self::Text, Value::String(s)) => Ok(Value::String(s)),
            (Self::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (_, v) => Err(v),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Boolean => write!(f, "boolean"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within its type.
    pub name: String,
    /// Declared kind.
    #[serde(default)]
    pub kind: FieldKind,
    /// Value used when instantiation supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    /// Declare a required field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Give the field a default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// The ordered field declarations of one type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    type_name: String,
    defs: Vec<FieldDef>,
}

impl FieldSet {
    /// Create an empty field set for the named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            defs: Vec::new(),
        }
    }

    /// Append a declaration. Names must be unique.
    pub fn push(&mut self, def: FieldDef) -> CoreResult<()> {
        if self.get(&def.name).is_some() {
            return Err(CoreError::DuplicateField {
                type_name: self.type_name.clone(),
                field: def.name,
            });
        }
        self.defs.push(def);
        Ok(())
    }

    /// The name of the type these fields belong to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Look up a declaration by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.defs.iter()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Check that `names` would satisfy these declarations, without values.
    ///
    /// Used to reject bindings for undeclared fields, or bindings that leave a
    /// required field unset, before any value is resolved.
    pub fn check_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> CoreResult<()> {
        let names: Vec<&str> = names.into_iter().collect();
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(CoreError::UnknownField {
                type_name: self.type_name.clone(),
                field: (*unknown).to_string(),
            });
        }
        match self
            .defs
            .iter()
            .find(|d| d.default.is_none() && !names.contains(&d.name.as_str()))
        {
            Some(def) => Err(CoreError::MissingField {
                type_name: self.type_name.clone(),
                field: def.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Validate supplied values against the declarations and fill defaults.
    ///
    /// Every supplied name must be declared; every declared field without a
    /// default must be supplied. A later duplicate overrides an earlier one.
    pub fn build(&self, supplied: impl IntoIterator<Item = (String, Value)>) -> CoreResult<Fields> {
        let mut fields = Fields::new();
        for (name, value) in supplied {
            let Some(def) = self.get(&name) else {
                return Err(CoreError::UnknownField {
                    type_name: self.type_name.clone(),
                    field: name,
                });
            };
            let value = def.kind.coerce(value).map_err(|rejected| CoreError::KindMismatch {
                type_name: self.type_name.clone(),
                field: name.clone(),
                expected: def.kind,
                found: rejected.kind_name(),
            })?;
            fields.insert(name, value);
        }

        for def in &self.defs {
            if fields.contains_key(&def.name) {
                continue;
            }
            match &def.default {
                Some(default) => {
                    fields.insert(def.name.clone(), default.clone());
                }
                None => {
                    return Err(CoreError::MissingField {
                        type_name: self.type_name.clone(),
                        field: def.name.clone(),
                    });
                }
            }
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn customer_fields() -> FieldSet {
        let mut set = FieldSet::new("Customer");
        set.push(FieldDef::new("customer_id", FieldKind::Integer))
            .unwrap();
        set.push(FieldDef::new("name", FieldKind::Text).with_default("anonymous"))
            .unwrap();
        set.push(FieldDef::new("balance", FieldKind::Float).with_default(0.0))
            .unwrap();
        set
    }

    #[test]
    fn build_fills_defaults() {
        let fields = customer_fields()
            .build([("customer_id".to_string(), Value::Integer(7))])
            .unwrap();
        assert_eq!(fields["customer_id"], Value::Integer(7));
        assert_eq!(fields["name"], Value::from("anonymous"));
        assert_eq!(fields["balance"], Value::Float(0.0));
    }

    #[test]
    fn build_rejects_unknown_field() {
        let err = customer_fields()
            .build([
                ("customer_id".to_string(), Value::Integer(1)),
                ("email".to_string(), Value::from("a@b")),
            ])
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownField { ref field, .. } if field == "email"));
    }

    #[test]
    fn build_rejects_missing_required_field() {
        let err = customer_fields().build([]).unwrap_err();
        assert!(matches!(err, CoreError::MissingField { ref field, .. } if field == "customer_id"));
    }

    #[test]
    fn build_rejects_kind_mismatch() {
        let err = customer_fields()
            .build([("customer_id".to_string(), Value::from("seven"))])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Customer.customer_id expects integer, got string"
        );
    }

    #[test]
    fn duplicate_declaration_rejected() {
        let mut set = customer_fields();
        let err = set.push(FieldDef::new("name", FieldKind::Any)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateField { .. }));
    }

    #[test]
    fn check_names_matches_build() {
        let set = customer_fields();
        assert!(set.check_names(["customer_id", "name"]).is_ok());
        assert!(matches!(
            set.check_names(["name"]),
            Err(CoreError::MissingField { ref field, .. }) if field == "customer_id"
        ));
        assert!(matches!(
            set.check_names(["customer_id", "email"]),
            Err(CoreError::UnknownField { ref field, .. }) if field == "email"
        ));
    }

    #[test]
    fn null_accepted_by_every_kind() {
        for kind in [
            FieldKind::Integer,
            FieldKind::Float,
            FieldKind::Text,
            FieldKind::Boolean,
            FieldKind::Any,
        ] {
            assert_eq!(kind.coerce(Value::Null), Ok(Value::Null));
        }
    }

    proptest! {
        #[test]
        fn integers_widen_to_float(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(FieldKind::Float.coerce(Value::Integer(n)), Ok(Value::Float(n as f64)));
        }

        #[test]
        fn integral_floats_narrow_to_integer(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(FieldKind::Integer.coerce(Value::Float(n as f64)), Ok(Value::Integer(n)));
        }
    }
}
