use std::cmp::Ordering;

use cadence_core::{EntityRef, EventRef, Value};

use crate::ast::{BinaryOp, Expr, Func, Root, UnaryOp};
use crate::error::{ExprError, ExprResult};

/// The state an expression is evaluated against.
///
/// The simulation implements this for each `(sim, parent, timestamp)` frame.
/// Lookups return `None` for names that do not exist; the evaluator turns
/// that into the appropriate error.
pub trait Scope {
    /// A scalar attribute of `sim` (`interval`, `timestamp`, `step`, ...).
    fn sim_attr(&self, name: &str) -> Option<Value>;

    /// Handles of every live entity of a type, in registration order.
    fn entities(&self, type_name: &str) -> Option<Vec<Value>>;

    /// Handles of every event of a type, in creation order.
    fn events(&self, type_name: &str) -> Option<Vec<Value>>;

    /// The entity that owns the emitter being resolved.
    fn parent(&self) -> Value;

    /// The occurrence timestamp.
    fn timestamp(&self) -> i64;

    /// A field of an entity.
    fn entity_attr(&self, entity: &EntityRef, name: &str) -> Option<Value>;

    /// A field of an event, or its `timestamp` / `parent`.
    fn event_attr(&self, event: &EventRef, name: &str) -> Option<Value>;
}

/// Intermediate result: `sim` and its two namespaces are only valid as the
/// target of an attribute access.
enum Operand {
    Value(Value),
    Sim,
    Entities,
    Events,
}

/// Evaluate an expression tree.
pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> ExprResult<Value> {
    value(expr, scope)
}

/// Read `name` from a value. Entity and event handles resolve through the
/// scope, with `type` and `index` available on both when no field shadows
/// them.
pub fn attribute(scope: &dyn Scope, target: &Value, name: &str) -> ExprResult<Value> {
    let found = match target {
        Value::Entity(entity) => scope.entity_attr(entity, name).or_else(|| match name {
            "type" => Some(Value::from(entity.type_name.as_str())),
            "index" => Some(index_value(entity.index)),
            _ => None,
        }),
        Value::Event(event) => scope.event_attr(event, name).or_else(|| match name {
            "type" => Some(Value::from(event.type_name.as_str())),
            "index" => Some(index_value(event.index)),
            _ => None,
        }),
        _ => None,
    };

    found.ok_or_else(|| ExprError::UnknownAttribute {
        owner: match target {
            Value::Entity(r) => r.to_string(),
            Value::Event(r) => r.to_string(),
            other => other.kind_name().to_string(),
        },
        name: name.to_string(),
    })
}

fn index_value(index: usize) -> Value {
    Value::Integer(i64::try_from(index).unwrap_or(i64::MAX))
}

fn value(expr: &Expr, scope: &dyn Scope) -> ExprResult<Value> {
    match operand(expr, scope)? {
        Operand::Value(v) => Ok(v),
        Operand::Sim => Err(ExprError::NotAValue("sim".into())),
        Operand::Entities => Err(ExprError::NotAValue("sim.entities".into())),
        Operand::Events => Err(ExprError::NotAValue("sim.events".into())),
    }
}

fn operand(expr: &Expr, scope: &dyn Scope) -> ExprResult<Operand> {
    let v = match expr {
        Expr::Literal(v) => v.clone(),
        Expr::List(items) => Value::List(
            items
                .iter()
                .map(|item| value(item, scope))
                .collect::<ExprResult<_>>()?,
        ),
        Expr::Root(Root::Sim) => return Ok(Operand::Sim),
        Expr::Root(Root::Parent) => scope.parent(),
        Expr::Root(Root::Timestamp) => Value::Integer(scope.timestamp()),
        Expr::Attr { target, name } => return attr(operand(target, scope)?, name, scope),
        Expr::Index { target, index } => {
            let target = value(target, scope)?;
            let index = value(index, scope)?;
            subscript(&target, &index)?
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|arg| value(arg, scope))
                .collect::<ExprResult<Vec<_>>>()?;
            call(*func, args)?
        }
        Expr::Unary { op, expr } => unary(*op, value(expr, scope)?)?,
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => Value::Boolean(value(lhs, scope)?.is_truthy() && value(rhs, scope)?.is_truthy()),
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => Value::Boolean(value(lhs, scope)?.is_truthy() || value(rhs, scope)?.is_truthy()),
        Expr::Binary { op, lhs, rhs } => binary(*op, value(lhs, scope)?, value(rhs, scope)?)?,
    };
    Ok(Operand::Value(v))
}

fn attr(target: Operand, name: &str, scope: &dyn Scope) -> ExprResult<Operand> {
    match target {
        Operand::Sim => match name {
            "entities" => Ok(Operand::Entities),
            "events" => Ok(Operand::Events),
            _ => scope
                .sim_attr(name)
                .map(Operand::Value)
                .ok_or_else(|| ExprError::UnknownAttribute {
                    owner: "sim".into(),
                    name: name.to_string(),
                }),
        },
        Operand::Entities => scope
            .entities(name)
            .map(|items| Operand::Value(Value::List(items)))
            .ok_or_else(|| ExprError::UnknownType {
                namespace: "entity",
                name: name.to_string(),
            }),
        Operand::Events => scope
            .events(name)
            .map(|items| Operand::Value(Value::List(items)))
            .ok_or_else(|| ExprError::UnknownType {
                namespace: "event",
                name: name.to_string(),
            }),
        Operand::Value(v) => attribute(scope, &v, name).map(Operand::Value),
    }
}

/// Resolve a possibly negative index against a length.
fn position(index: &Value, len: usize) -> ExprResult<usize> {
    let Value::Integer(i) = index else {
        return Err(ExprError::TypeMismatch {
            context: "index".into(),
            expected: "integer",
            found: index.kind_name(),
        });
    };
    let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if *i < 0 { signed_len + i } else { *i };
    if (0..signed_len).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(ExprError::IndexOutOfRange { index: *i, len })
    }
}

fn subscript(target: &Value, index: &Value) -> ExprResult<Value> {
    match target {
        Value::List(items) => Ok(items[position(index, items.len())?].clone()),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let at = position(index, chars.len())?;
            Ok(Value::String(chars[at].to_string()))
        }
        other => Err(ExprError::TypeMismatch {
            context: "indexing".into(),
            expected: "list or string",
            found: other.kind_name(),
        }),
    }
}

fn call(func: Func, args: Vec<Value>) -> ExprResult<Value> {
    let mismatch = |expected, found: &Value| ExprError::TypeMismatch {
        context: format!("`{func}`"),
        expected,
        found: found.kind_name(),
    };
    let conversion = |found: &Value| ExprError::Conversion {
        func,
        value: found.to_string(),
    };

    let mut args = args.into_iter();
    let arg = args.next().unwrap_or(Value::Null);
    match func {
        Func::Min | Func::Max => extremum(func, arg, args.next().unwrap_or(Value::Null)),
        Func::Len => match &arg {
            Value::List(items) => Ok(index_value(items.len())),
            Value::String(s) => Ok(index_value(s.chars().count())),
            other => Err(mismatch("list or string", other)),
        },
        Func::Int => match &arg {
            Value::Integer(n) => Ok(Value::Integer(*n)),
            Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
            Value::Float(x) => truncate(*x).ok_or_else(|| conversion(&arg)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .map(Value::Integer)
                    .or_else(|| s.parse::<f64>().ok().and_then(truncate))
                    .ok_or_else(|| conversion(&arg))
            }
            other => Err(mismatch("number, boolean or string", other)),
        },
        Func::Float => match &arg {
            Value::Integer(n) => Ok(Value::Float(*n as f64)),
            Value::Float(x) => Ok(Value::Float(*x)),
            Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| conversion(&arg)),
            other => Err(mismatch("number, boolean or string", other)),
        },
        Func::Str => Ok(match arg {
            Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        }),
        Func::Abs => match &arg {
            Value::Integer(n) => n
                .checked_abs()
                .map(Value::Integer)
                .ok_or_else(|| ExprError::Overflow("abs".into())),
            Value::Float(x) => Ok(Value::Float(x.abs())),
            other => Err(mismatch("number", other)),
        },
    }
}

fn extremum(func: Func, a: Value, b: Value) -> ExprResult<Value> {
    let ordering = order(&a, &b).ok_or_else(|| ExprError::TypeMismatch {
        context: format!("`{func}`"),
        expected: "two numbers or two strings",
        found: b.kind_name(),
    })?;
    let pick_b = match func {
        Func::Min => ordering == Ordering::Greater,
        _ => ordering == Ordering::Less,
    };
    Ok(if pick_b { b } else { a })
}

fn truncate(x: f64) -> Option<Value> {
    let t = x.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then(|| Value::Integer(t as i64))
}

fn unary(op: UnaryOp, v: Value) -> ExprResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!v.is_truthy())),
        UnaryOp::Neg => match v {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| ExprError::Overflow("-".into())),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(ExprError::TypeMismatch {
                context: "unary `-`".into(),
                expected: "number",
                found: other.kind_name(),
            }),
        },
    }
}

/// Ordering for numbers (across integer/float) and strings.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.as_float()?.partial_cmp(&b.as_float()?),
    }
}

fn is_number(v: &Value) -> bool {
    matches!(v, Value::Integer(_) | Value::Float(_))
}

fn equal(a: &Value, b: &Value) -> bool {
    if is_number(a) && is_number(b) {
        order(a, b) == Some(Ordering::Equal)
    } else {
        a == b
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> ExprResult<Value> {
    let mismatch = |lhs: &Value, rhs: &Value| ExprError::BinaryMismatch {
        op,
        lhs: lhs.kind_name(),
        rhs: rhs.kind_name(),
    };
    let overflow = || ExprError::Overflow(op.to_string());

    match op {
        BinaryOp::Eq => return Ok(Value::Boolean(equal(&lhs, &rhs))),
        BinaryOp::Ne => return Ok(Value::Boolean(!equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let comparable = (is_number(&lhs) && is_number(&rhs))
                || matches!((&lhs, &rhs), (Value::String(_), Value::String(_)));
            if !comparable {
                return Err(mismatch(&lhs, &rhs));
            }
            // NaN compares false against everything.
            let result = order(&lhs, &rhs).is_some_and(|o| match op {
                BinaryOp::Lt => o == Ordering::Less,
                BinaryOp::Le => o != Ordering::Greater,
                BinaryOp::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            });
            return Ok(Value::Boolean(result));
        }
        _ => {}
    }

    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(a + &b)),
        (Value::List(mut a), Value::List(b)) if op == BinaryOp::Add => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (Value::Integer(a), Value::Integer(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Div if b == 0 => Err(ExprError::DivisionByZero),
            BinaryOp::Div => Ok(Value::Float(a as f64 / b as f64)),
            BinaryOp::Rem if b == 0 => Err(ExprError::DivisionByZero),
            BinaryOp::Rem => a.checked_rem_euclid(b).map(Value::Integer).ok_or_else(overflow),
            _ => Err(ExprError::BinaryMismatch {
                op,
                lhs: "integer",
                rhs: "integer",
            }),
        },
        (lhs, rhs) => {
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return Err(mismatch(&lhs, &rhs));
            };
            match op {
                BinaryOp::Add => Ok(Value::Float(a + b)),
                BinaryOp::Sub => Ok(Value::Float(a - b)),
                BinaryOp::Mul => Ok(Value::Float(a * b)),
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(ExprError::DivisionByZero),
                BinaryOp::Div => Ok(Value::Float(a / b)),
                BinaryOp::Rem => Ok(Value::Float(a.rem_euclid(b))),
                _ => Err(mismatch(&lhs, &rhs)),
            }
        }
    }
}
