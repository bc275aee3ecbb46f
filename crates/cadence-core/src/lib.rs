//! Core types for Cadence: dynamic values, object handles, and field declarations.
//!
//! This crate defines the data model shared by the expression language, the
//! simulation engine, and the exporters. It knows nothing about scheduling or
//! randomness; those live in `cadence-sim`.

/// Error types used throughout the crate.
pub mod error;
/// Field declarations and validation of supplied field values.
pub mod field;
/// Non-owning handles to entities and events held by a simulation.
pub mod handle;
/// The dynamic value type produced by bindings and stored in records.
pub mod value;

/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export field declaration types.
pub use field::{FieldDef, FieldKind, FieldSet, Fields};
/// Re-export handle types.
pub use handle::{EntityRef, EventRef, TypeName};
/// Re-export the value type.
pub use value::Value;
