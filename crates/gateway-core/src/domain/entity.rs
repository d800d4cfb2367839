//! Storage-facing value types: operations, rows, conditions, permissions and
//! the server-computed system columns.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{RequestContext, SecurityContext};
use std::collections::BTreeMap;
use std::fmt;

/// A storage row: column name to JSON value, in column order.
pub type Row = BTreeMap<String, Value>;

/// The four operation kinds every entity supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(format!("unknown operation '{}'", other)),
        }
    }
}

/// An authorization unit: the fields of one table an operation touches.
///
/// An empty `field_names` list asks for table-level access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPermission {
    pub table_name: String,
    pub field_names: Vec<String>,
}

impl FieldPermission {
    pub fn new<I, S>(table_name: impl Into<String>, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            field_names: field_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            field_names: Vec::new(),
        }
    }
}

/// Extra predicate applied on top of the primary-key match of a read.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    #[default]
    None,
    Eq {
        column: String,
        value: Value,
    },
    And(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Evaluate against a stored row. A missing column compares as `null`.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::None => true,
            Condition::Eq { column, value } => row.get(column).unwrap_or(&Value::Null) == value,
            Condition::And(all) => all.iter().all(|c| c.matches(row)),
        }
    }
}

/// Precondition a write statement carries down to the store, checked in the
/// same critical section as the write itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowExpectation {
    #[default]
    Any,
    MustExist,
    MustNotExist,
}

/// Canonical string form of a primary-key value used for indexing.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Audit columns computed by the gateway, never taken from the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysColumns {
    pub curr_user: Option<String>,
    pub source_system: Option<String>,
    pub source_application: Option<String>,
    pub source_process: Option<String>,
    pub source_process_definition_id: Option<String>,
    pub source_process_instance_id: Option<String>,
    pub business_activity: Option<String>,
    pub source_activity_instance_id: Option<String>,
    pub digital_sign: Option<String>,
    pub digital_sign_derived: Option<String>,
}

impl SysColumns {
    pub const COLUMNS: [&'static str; 10] = [
        "curr_user",
        "source_system",
        "source_application",
        "source_process",
        "source_process_definition_id",
        "source_process_instance_id",
        "business_activity",
        "source_activity_instance_id",
        "digital_sign",
        "digital_sign_derived",
    ];

    pub fn from_envelope(
        caller: Option<&str>,
        context: &RequestContext,
        security: &SecurityContext,
    ) -> Self {
        Self {
            curr_user: caller.map(str::to_owned),
            source_system: context.system.clone(),
            source_application: context.application.clone(),
            source_process: context.business_process.clone(),
            source_process_definition_id: context.business_process_definition_id.clone(),
            source_process_instance_id: context.business_process_instance_id.clone(),
            business_activity: context.business_activity.clone(),
            source_activity_instance_id: context.business_activity_instance_id.clone(),
            digital_sign: security.digital_signature.clone(),
            digital_sign_derived: security.digital_signature_derived.clone(),
        }
    }

    /// Column/value pairs in `COLUMNS` order. Unset values are empty.
    pub fn entries(&self) -> [(&'static str, &str); 10] {
        let values = [
            &self.curr_user,
            &self.source_system,
            &self.source_application,
            &self.source_process,
            &self.source_process_definition_id,
            &self.source_process_instance_id,
            &self.business_activity,
            &self.source_activity_instance_id,
            &self.digital_sign,
            &self.digital_sign_derived,
        ];
        let mut out = [("", ""); 10];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (Self::COLUMNS[i], value.as_deref().unwrap_or(""));
        }
        out
    }
}
