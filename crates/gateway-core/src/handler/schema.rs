//! Per-entity capability set.
//!
//! An entity is described once by an `EntitySchema`; the pipeline is
//! generic over it. Records travel on the wire in their serde form and are
//! stored as rows keyed by snake_case column names.

use crate::domain::{
    Condition, FieldPermission, Operation, RequestError, Row, RowExpectation,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::Envelope;

pub trait EntitySchema: Send + Sync + 'static {
    /// Record as carried by create/update/delete payloads and read replies.
    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Read request payload.
    type Id: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn table_name(&self) -> &str;

    fn pk_column(&self) -> &str;

    /// Every storage column of the entity.
    fn columns(&self) -> &[&'static str];

    /// Columns holding a file reference, stored as `(id,checksum)`.
    fn file_columns(&self) -> &[&'static str] {
        &[]
    }

    /// Fields the caller must be allowed to touch. Reads cover every column,
    /// writes the columns present in the row, deletes the primary key.
    fn required_fields(&self, operation: Operation, row: Option<&Row>) -> Vec<FieldPermission> {
        let fields: Vec<String> = match operation {
            Operation::Read => self.columns().iter().map(|c| c.to_string()).collect(),
            Operation::Create | Operation::Update => row
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default(),
            Operation::Delete => vec![self.pk_column().to_string()],
        };
        vec![FieldPermission::new(self.table_name(), fields)]
    }

    /// Existence policy checked atomically with the write.
    fn precondition(&self, operation: Operation) -> RowExpectation {
        match operation {
            Operation::Create => RowExpectation::MustNotExist,
            Operation::Update | Operation::Delete => RowExpectation::MustExist,
            Operation::Read => RowExpectation::Any,
        }
    }

    /// Extra condition every read adds to the key match.
    fn read_condition(&self, _envelope: &Envelope<Self::Id>) -> Condition {
        Condition::None
    }

    fn to_row(&self, record: &Self::Record) -> Result<Row, RequestError> {
        let value = serde_json::to_value(record)
            .map_err(|e| RequestError::InputShapeInvalid(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(RequestError::InputShapeInvalid(format!(
                "{} record must be an object",
                self.table_name()
            )));
        };

        let mut row = Row::new();
        for (field, value) in fields {
            if value.is_null() {
                continue;
            }
            let column = column_name(&field);
            let value = if self.file_columns().contains(&column.as_str()) {
                Value::String(file_composite(&value).ok_or_else(|| {
                    RequestError::InputShapeInvalid(format!(
                        "{} must be a file reference",
                        field
                    ))
                })?)
            } else {
                value
            };
            row.insert(column, value);
        }
        Ok(row)
    }

    fn from_row(&self, row: Row) -> Result<Self::Record, RequestError> {
        let mut fields = Map::new();
        for (column, value) in row {
            let file = match &value {
                Value::String(s) if self.file_columns().contains(&column.as_str()) => {
                    parse_file_composite(s)
                }
                _ => None,
            };
            fields.insert(field_name(&column), file.unwrap_or(value));
        }
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            RequestError::DataAccess(format!(
                "Couldn't map row of table '{}': {}",
                self.table_name(),
                e
            ))
        })
    }

    /// Primary key value of a read request.
    fn pk_value(&self, id: &Self::Id) -> Result<Value, RequestError> {
        let value =
            serde_json::to_value(id).map_err(|e| RequestError::InputShapeInvalid(e.to_string()))?;
        let key = match value {
            Value::Object(mut fields) => fields
                .remove(self.pk_column())
                .or_else(|| fields.remove(&field_name(self.pk_column())))
                .unwrap_or(Value::Null),
            other => other,
        };
        if key.is_null() {
            return Err(RequestError::InputShapeInvalid(format!(
                "missing primary key '{}'",
                self.pk_column()
            )));
        }
        Ok(key)
    }
}

/// camelCase field → snake_case column.
pub fn column_name(field: &str) -> String {
    let mut column = String::with_capacity(field.len() + 4);
    for (i, ch) in field.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                column.push('_');
            }
            column.push(ch.to_ascii_lowercase());
        } else {
            column.push(ch);
        }
    }
    column
}

/// snake_case column → camelCase field.
pub fn field_name(column: &str) -> String {
    let mut field = String::with_capacity(column.len());
    let mut upper = false;
    for ch in column.chars() {
        if ch == '_' {
            upper = !field.is_empty();
        } else if upper {
            field.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            field.push(ch);
        }
    }
    field
}

fn file_composite(value: &Value) -> Option<String> {
    let id = value.get("id")?.as_str()?;
    let checksum = value.get("checksum")?.as_str()?;
    Some(format!("({},{})", id, checksum))
}

fn parse_file_composite(stored: &str) -> Option<Value> {
    let inner = stored.strip_prefix('(')?.strip_suffix(')')?;
    let (id, checksum) = inner.split_once(',')?;
    Some(serde_json::json!({ "id": id, "checksum": checksum }))
}
