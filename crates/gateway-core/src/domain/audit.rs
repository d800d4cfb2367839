//! Audit events handed to the audit observer around every data operation.

use super::entity::Operation;
use serde::Serialize;
use shared_types::Status;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure { status: Status, details: String },
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuditOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub operation: Operation,
    pub table: String,
    /// `None` when the caller could not be identified.
    pub caller: Option<String>,
    pub outcome: AuditOutcome,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl AuditEvent {
    pub fn new(
        operation: Operation,
        table: impl Into<String>,
        caller: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            operation,
            table: table.into(),
            caller,
            outcome,
            at: chrono::Utc::now(),
        }
    }
}
