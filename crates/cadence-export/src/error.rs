use crate::schema::SqlType;

/// Alias for `Result<T, ExportError>`.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while deriving schemas or rendering exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Two types writing to one table disagree on a column's type.
    #[error("table `{table}`: column `{column}` is {first} for one type and {second} for another")]
    ColumnConflict {
        /// The shared table.
        table: String,
        /// The conflicting column.
        column: String,
        /// Type of the column as first declared.
        first: SqlType,
        /// Type of the later declaration.
        second: SqlType,
    },

    /// A declared field shadows a generated column.
    #[error("{type_name} declares field `{column}`, which is a generated column")]
    ReservedColumn {
        /// The declaring type.
        type_name: String,
        /// The field name.
        column: String,
    },

    /// The requested format is not supported.
    #[error("unsupported format `{0}` (expected sql or json)")]
    UnknownFormat(String),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
