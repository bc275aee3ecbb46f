use crate::field::FieldKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building a record from supplied field values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A value was supplied for a field the type does not declare.
    #[error("{type_name} has no field named \"{field}\"")]
    UnknownField {
        /// The type being instantiated.
        type_name: String,
        /// The undeclared field name.
        field: String,
    },

    /// A declared field without a default received no value.
    #[error("{type_name} is missing a value for field \"{field}\"")]
    MissingField {
        /// The type being instantiated.
        type_name: String,
        /// The field left unset.
        field: String,
    },

    /// A value could not be stored in a field of the declared kind.
    #[error("{type_name}.{field} expects {expected}, got {found}")]
    KindMismatch {
        /// The type being instantiated.
        type_name: String,
        /// The field that rejected the value.
        field: String,
        /// The declared kind of the field.
        expected: FieldKind,
        /// The kind name of the rejected value.
        found: &'static str,
    },

    /// The same field name was declared twice on one type.
    #[error("{type_name} declares field \"{field}\" more than once")]
    DuplicateField {
        /// The type with the duplicate declaration.
        type_name: String,
        /// The duplicated field name.
        field: String,
    },
}
