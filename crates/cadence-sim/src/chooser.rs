use std::fmt;

use cadence_core::{EntityRef, Value};
use cadence_expr::Expression;
use rand::Rng;

use crate::context::{Frame, SimContext};
use crate::error::{SimError, SimResult};

/// A binding delegate that computes a value from the simulation, the parent
/// entity and the timestamp, drawing randomness only from `ctx.rng`.
pub trait Chooser: fmt::Debug + Send + Sync {
    /// Produce a value for one occurrence.
    fn choose(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        timestamp: i64,
    ) -> SimResult<Value>;
}

/// Picks one element of a list uniformly at random, optionally reading an
/// attribute of the pick.
///
/// `objects` is evaluated like any expression binding, typically
/// `sim.entities.Product`.
#[derive(Debug, Clone)]
pub struct RandomAttributeChooser {
    objects: Expression,
    attribute: Option<String>,
}

impl RandomAttributeChooser {
    /// Choose from the list `objects` evaluates to.
    pub fn new(objects: Expression) -> Self {
        Self {
            objects,
            attribute: None,
        }
    }

    /// Return `attribute` of the picked element instead of the element.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl Chooser for RandomAttributeChooser {
    fn choose(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        timestamp: i64,
    ) -> SimResult<Value> {
        let frame = Frame::new(ctx.state, parent, timestamp);
        let items = match self.objects.evaluate(&frame)? {
            Value::List(items) => items,
            other => {
                return Err(SimError::Chooser(format!(
                    "`{}` evaluated to {}, expected a list",
                    self.objects,
                    other.kind_name()
                )));
            }
        };
        if items.is_empty() {
            return Err(SimError::Chooser(format!(
                "`{}` evaluated to an empty list",
                self.objects
            )));
        }

        let picked = &items[ctx.rng.random_range(0..items.len())];
        match &self.attribute {
            Some(attribute) => Ok(cadence_expr::attribute(&frame, picked, attribute)?),
            None => Ok(picked.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::state::SimState;
    use cadence_core::Fields;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> (SimState, EntityRef) {
        let mut state = SimState::new(1, 0, 3600);
        state
            .register_entity_type(EntityType::new("Product"))
            .unwrap();
        state
            .register_entity_type(EntityType::new("Store"))
            .unwrap();
        for (sku, price) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            let mut fields = Fields::new();
            fields.insert("sku".into(), Value::from(sku));
            fields.insert("price".into(), Value::Float(price));
            state.push_entity(0, fields, None);
        }
        let store = state.push_entity(1, Fields::new(), None);
        (state, store)
    }

    fn chooser(attribute: Option<&str>) -> RandomAttributeChooser {
        let base = RandomAttributeChooser::new(Expression::parse("sim.entities.Product").unwrap());
        match attribute {
            Some(attr) => base.with_attribute(attr),
            None => base,
        }
    }

    #[test]
    fn picks_attribute_of_a_listed_object() {
        let (state, store) = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SimContext::new(&state, &mut rng);
        for _ in 0..20 {
            let sku = chooser(Some("sku")).choose(&mut ctx, &store, 0).unwrap();
            assert!(["a", "b", "c"].contains(&sku.as_str().unwrap()));
        }
    }

    #[test]
    fn without_attribute_returns_the_handle() {
        let (state, store) = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SimContext::new(&state, &mut rng);
        let picked = chooser(None).choose(&mut ctx, &store, 0).unwrap();
        assert!(matches!(picked, Value::Entity(ref r) if r.type_name.as_str() == "Product"));
    }

    #[test]
    fn same_seed_same_picks() {
        let (state, store) = catalog();
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ctx = SimContext::new(&state, &mut rng);
            (0..10)
                .map(|_| chooser(Some("sku")).choose(&mut ctx, &store, 0).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(9), picks(9));
    }

    #[test]
    fn empty_list_is_an_error() {
        let (state, store) = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SimContext::new(&state, &mut rng);
        let empty = RandomAttributeChooser::new(Expression::parse("[]").unwrap());
        assert!(matches!(
            empty.choose(&mut ctx, &store, 0),
            Err(SimError::Chooser(_))
        ));
    }

    #[test]
    fn non_list_is_an_error() {
        let (state, store) = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SimContext::new(&state, &mut rng);
        let scalar = RandomAttributeChooser::new(Expression::parse("timestamp").unwrap());
        assert!(scalar.choose(&mut ctx, &store, 0).is_err());
    }
}
