//! Role-based field access policy.

use crate::domain::{Claims, FieldPermission, Operation, RoleGrant};
use crate::ports::AccessEvaluator;
use tracing::debug;

/// Grants access when, for every required permission, the caller's realm
/// roles together cover the table, the operation and every listed field.
#[derive(Debug, Clone, Default)]
pub struct RoleAccessEvaluator {
    grants: Vec<RoleGrant>,
}

impl RoleAccessEvaluator {
    pub fn new(grants: Vec<RoleGrant>) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &[RoleGrant] {
        &self.grants
    }

    fn applicable<'a>(
        &'a self,
        operation: Operation,
        table: &'a str,
        claims: &'a Claims,
    ) -> impl Iterator<Item = &'a RoleGrant> + 'a {
        self.grants.iter().filter(move |g| {
            g.table == table && g.operations.contains(&operation) && claims.has_role(&g.role)
        })
    }

    fn permits(&self, operation: Operation, required: &FieldPermission, claims: &Claims) -> bool {
        let grants: Vec<&RoleGrant> = self
            .applicable(operation, &required.table_name, claims)
            .collect();
        if grants.is_empty() {
            return false;
        }
        if grants.iter().any(|g| g.covers_all_fields()) {
            return true;
        }
        if required.field_names.is_empty() {
            return false;
        }
        required
            .field_names
            .iter()
            .all(|field| grants.iter().any(|g| g.fields.iter().any(|f| f == field)))
    }
}

impl AccessEvaluator for RoleAccessEvaluator {
    fn has_access(
        &self,
        operation: Operation,
        required: &[FieldPermission],
        claims: &Claims,
    ) -> bool {
        let denied = required
            .iter()
            .find(|permission| !self.permits(operation, permission, claims));
        match denied {
            Some(permission) => {
                debug!(
                    table = %permission.table_name,
                    %operation,
                    subject = claims.subject().unwrap_or("-"),
                    "Access denied"
                );
                false
            }
            None => true,
        }
    }
}
