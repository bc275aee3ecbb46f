use std::fmt;

use cadence_core::{FieldKind, FieldSet, TypeName};
use cadence_sim::SimState;

use crate::error::{ExportError, ExportResult};

/// Column types emitted in DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `INTEGER`
    Integer,
    /// `REAL`
    Real,
    /// `TEXT`
    Text,
    /// `BOOLEAN`
    Boolean,
}

impl From<FieldKind> for SqlType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer => Self::Integer,
            FieldKind::Float => Self::Real,
            FieldKind::Boolean => Self::Boolean,
            FieldKind::Text | FieldKind::Any => Self::Text,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Real => write!(f, "REAL"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// Generated columns of event tables, ahead of the declared fields.
pub const EVENT_COLUMNS: [(&str, SqlType); 2] =
    [("timestamp", SqlType::Integer), ("parent", SqlType::Text)];

/// Generated columns of entity tables, ahead of the declared fields.
pub const ENTITY_COLUMNS: [(&str, SqlType); 1] = [("created_at", SqlType::Integer)];

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub sql_type: SqlType,
}

/// Which registry a table's rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Events of the named type.
    Event(TypeName),
    /// Entities of the named type.
    Entity(TypeName),
}

/// A table and the types that write to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns, in first-declaration order.
    pub columns: Vec<Column>,
    /// Contributing types, in registration order.
    pub sources: Vec<Source>,
}

impl TableSchema {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            sources: Vec::new(),
        }
    }

    fn merge_column(&mut self, name: &str, sql_type: SqlType) -> ExportResult<()> {
        match self.columns.iter().find(|c| c.name == name) {
            Some(existing) if existing.sql_type != sql_type => Err(ExportError::ColumnConflict {
                table: self.name.clone(),
                column: name.to_string(),
                first: existing.sql_type,
                second: sql_type,
            }),
            Some(_) => Ok(()),
            None => {
                self.columns.push(Column {
                    name: name.to_string(),
                    sql_type,
                });
                Ok(())
            }
        }
    }

    fn merge_type(
        &mut self,
        source: Source,
        generated: &[(&str, SqlType)],
        fields: &FieldSet,
    ) -> ExportResult<()> {
        for (name, sql_type) in generated {
            self.merge_column(name, *sql_type)?;
        }
        for def in fields.iter() {
            if generated.iter().any(|(name, _)| *name == def.name) {
                return Err(ExportError::ReservedColumn {
                    type_name: fields.type_name().to_string(),
                    column: def.name.clone(),
                });
            }
            self.merge_column(&def.name, def.kind.into())?;
        }
        self.sources.push(source);
        Ok(())
    }

    /// The `CREATE TABLE` statement.
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("  {} {}", identifier(&c.name), c.sql_type))
            .collect();
        format!(
            "CREATE TABLE {} (\n{}\n);",
            identifier(&self.name),
            columns.join(",\n")
        )
    }
}

/// Quote `name` unless it is a plain identifier.
pub fn identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn table<'a>(tables: &'a mut Vec<TableSchema>, name: &str) -> &'a mut TableSchema {
    let index = match tables.iter().position(|t| t.name == name) {
        Some(index) => index,
        None => {
            tables.push(TableSchema::new(name));
            tables.len() - 1
        }
    };
    &mut tables[index]
}

/// Derive every table: event tables first, then entity tables that name a
/// table, in registration order. Types sharing a table name merge their
/// columns.
pub fn derive(state: &SimState) -> ExportResult<Vec<TableSchema>> {
    let mut tables: Vec<TableSchema> = Vec::new();
    for ty in state.event_types() {
        table(&mut tables, ty.table()).merge_type(
            Source::Event(ty.name().clone()),
            &EVENT_COLUMNS,
            ty.fields(),
        )?;
    }
    for ty in state.entity_types() {
        let Some(name) = ty.table() else { continue };
        table(&mut tables, name).merge_type(
            Source::Entity(ty.name().clone()),
            &ENTITY_COLUMNS,
            ty.fields(),
        )?;
    }
    Ok(tables)
}
