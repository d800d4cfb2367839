//! Audit observer writing structured events to the `audit` tracing target.

use crate::domain::{AuditEvent, AuditOutcome};
use crate::ports::AuditObserver;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditObserver;

impl AuditObserver for TracingAuditObserver {
    fn record(&self, event: &AuditEvent) {
        let caller = event.caller.as_deref().unwrap_or("-");
        match &event.outcome {
            AuditOutcome::Success => info!(
                target: "audit",
                operation = %event.operation,
                table = %event.table,
                caller,
                at = %event.at.to_rfc3339(),
                "Data operation succeeded"
            ),
            AuditOutcome::Failure { status, details } => warn!(
                target: "audit",
                operation = %event.operation,
                table = %event.table,
                caller,
                at = %event.at.to_rfc3339(),
                status = %status,
                details = %details,
                "Data operation failed"
            ),
        }
    }
}
