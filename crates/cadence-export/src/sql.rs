use cadence_core::{FieldSet, Fields, Value};
use cadence_sim::SimState;
use tracing::debug;

use crate::error::ExportResult;
use crate::schema::{self, Source, TableSchema, identifier};

/// Render `value` as an SQL literal.
///
/// Lists and handles are stored as quoted text. Non-finite floats become
/// `NULL`.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(x) if x.is_finite() => format!("{x:?}"),
        Value::Float(_) => "NULL".to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

struct Row {
    columns: Vec<String>,
    values: Vec<String>,
}

impl Row {
    fn new(generated: Vec<(&str, String)>, declared: &FieldSet, fields: &Fields) -> Self {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (name, value) in generated {
            columns.push(identifier(name));
            values.push(value);
        }
        for def in declared.iter() {
            columns.push(identifier(&def.name));
            values.push(literal(fields.get(&def.name).unwrap_or(&Value::Null)));
        }
        Self { columns, values }
    }

    fn insert(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            identifier(table),
            self.columns.join(", "),
            self.values.join(", ")
        )
    }
}

/// Rows of one table: events merged across types by timestamp, then
/// entities in live-list order.
fn rows(state: &SimState, table: &TableSchema) -> Vec<Row> {
    let mut events: Vec<(i64, Row)> = Vec::new();
    let mut entities: Vec<Row> = Vec::new();

    for source in &table.sources {
        match source {
            Source::Event(name) => {
                let (Some(ty), Some(list)) = (
                    state.event_type(name.as_str()),
                    state.events_of(name.as_str()),
                ) else {
                    continue;
                };
                events.extend(list.iter().map(|event| {
                    let generated = vec![
                        ("timestamp", event.timestamp.to_string()),
                        ("parent", quote(&event.parent.to_string())),
                    ];
                    (
                        event.timestamp,
                        Row::new(generated, ty.fields(), &event.fields),
                    )
                }));
            }
            Source::Entity(name) => {
                let (Some(ty), Some(list)) = (
                    state.entity_type(name.as_str()),
                    state.entities_of(name.as_str()),
                ) else {
                    continue;
                };
                entities.extend(list.iter().map(|entity| {
                    let created_at = entity
                        .created_at
                        .map_or_else(|| "NULL".to_string(), |ts| ts.to_string());
                    Row::new(vec![("created_at", created_at)], ty.fields(), &entity.fields)
                }));
            }
        }
    }

    events.sort_by_key(|(timestamp, _)| *timestamp);
    events.into_iter().map(|(_, row)| row).chain(entities).collect()
}

/// An SQL script: every `CREATE TABLE`, then every `INSERT`, in one
/// transaction.
pub fn script(state: &SimState) -> ExportResult<String> {
    let tables = schema::derive(state)?;

    let mut out = String::from("BEGIN TRANSACTION;\n");
    for table in &tables {
        out.push('\n');
        out.push_str(&table.create_statement());
        out.push('\n');
    }

    for table in &tables {
        let rows = rows(state, table);
        debug!(table = %table.name, rows = rows.len(), "rendering inserts");
        if rows.is_empty() {
            continue;
        }
        out.push('\n');
        for row in rows {
            out.push_str(&row.insert(&table.name));
            out.push('\n');
        }
    }

    out.push_str("\nCOMMIT;\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::shop;
    use cadence_core::EntityRef;

    #[test]
    fn literals_are_quoted() {
        assert_eq!(literal(&Value::Null), "NULL");
        assert_eq!(literal(&Value::Boolean(true)), "TRUE");
        assert_eq!(literal(&Value::Integer(-4)), "-4");
        assert_eq!(literal(&Value::Float(2.0)), "2.0");
        assert_eq!(literal(&Value::Float(f64::NAN)), "NULL");
        assert_eq!(literal(&Value::from("it's")), "'it''s'");
        assert_eq!(
            literal(&Value::Entity(EntityRef::new("Customer", 3))),
            "'Customer#3'"
        );
        assert_eq!(
            literal(&Value::List(vec![Value::Integer(1), Value::from("a")])),
            "'[1, a]'"
        );
    }

    #[test]
    fn script_interleaves_shared_table_by_timestamp() {
        let sql = script(&shop()).unwrap();
        insta::assert_snapshot!(sql.trim_end(), @r#"
        BEGIN TRANSACTION;

        CREATE TABLE activity (
          timestamp INTEGER,
          parent TEXT,
          total REAL,
          reason TEXT
        );

        CREATE TABLE customers (
          created_at INTEGER,
          name TEXT
        );

        INSERT INTO activity (timestamp, parent, total) VALUES (0, 'Customer#0', 12.5);
        INSERT INTO activity (timestamp, parent, total, reason) VALUES (30, 'Customer#0', -2.0, 'late');
        INSERT INTO activity (timestamp, parent, total) VALUES (60, 'Customer#0', 12.5);
        INSERT INTO activity (timestamp, parent, total, reason) VALUES (90, 'Customer#0', -2.0, 'late');

        INSERT INTO customers (created_at, name) VALUES (NULL, 'o''neil');

        COMMIT;
        "#);
    }
}
