//! The fixed CRUD step order shared by every entity.
//!
//! 1. authenticate (token validator)
//! 2. authorize (access evaluator), strictly before any data access
//! 3. one atomic data access statement
//! 4. map the row or write result
//!
//! Every invocation is reported to the audit observer, success or failure.

use super::schema::EntitySchema;
use crate::auth::TokenValidator;
use crate::domain::{
    value_key, AuditEvent, AuditOutcome, Claims, FieldPermission, Operation, RequestError,
    SysColumns,
};
use crate::ports::{
    AccessEvaluator, AuditObserver, DataAccessPort, ReadQuery, WriteResult, WriteStatement,
};
use serde_json::Value;
use shared_types::{EntityId, Envelope};
use std::sync::Arc;
use tracing::debug;

/// Collaborators wired into every handler at startup.
#[derive(Clone)]
pub struct HandlerContext {
    pub validator: Arc<TokenValidator>,
    pub access: Arc<dyn AccessEvaluator>,
    pub port: Arc<dyn DataAccessPort>,
    pub audit: Arc<dyn AuditObserver>,
}

pub struct EntityPipeline<E: EntitySchema> {
    schema: Arc<E>,
    ctx: HandlerContext,
}

impl<E: EntitySchema> Clone for EntityPipeline<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            ctx: self.ctx.clone(),
        }
    }
}

impl<E: EntitySchema> EntityPipeline<E> {
    pub fn new(schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self { schema, ctx }
    }

    pub fn schema(&self) -> &E {
        &self.schema
    }

    /// Reads one record by primary key. `Ok(None)` is a miss.
    pub async fn read(
        &self,
        envelope: &Envelope<E::Id>,
    ) -> Result<Option<E::Record>, RequestError> {
        let mut caller = None;
        let result = self.read_steps(envelope, &mut caller).await;
        self.report(Operation::Read, caller, &result);
        result
    }

    /// Applies one write. Creates return the id of the new record.
    pub async fn write(
        &self,
        operation: Operation,
        envelope: &Envelope<E::Record>,
    ) -> Result<Option<EntityId>, RequestError> {
        let mut caller = None;
        let result = self.write_steps(operation, envelope, &mut caller).await;
        self.report(operation, caller, &result);
        result
    }

    async fn read_steps(
        &self,
        envelope: &Envelope<E::Id>,
        caller: &mut Option<String>,
    ) -> Result<Option<E::Record>, RequestError> {
        let table = self.schema.table_name();
        let claims = self.ctx.validator.authenticate(&envelope.security).await?;
        *caller = claims.subject().map(str::to_owned);

        let required = self.schema.required_fields(Operation::Read, None);
        self.authorize(Operation::Read, &required, &claims)?;

        let query = ReadQuery {
            table: table.to_string(),
            pk_column: self.schema.pk_column().to_string(),
            pk_value: self.schema.pk_value(&envelope.payload)?,
            condition: self.schema.read_condition(envelope),
        };
        let row = self.ctx.port.read(&query).await.map_err(|e| {
            RequestError::DataAccess(format!("Couldn't read from table '{}': {}", table, e))
        })?;

        debug!(table, found = row.is_some(), "Read completed");
        row.map(|row| self.schema.from_row(row)).transpose()
    }

    async fn write_steps(
        &self,
        operation: Operation,
        envelope: &Envelope<E::Record>,
        caller: &mut Option<String>,
    ) -> Result<Option<EntityId>, RequestError> {
        if !operation.is_write() {
            return Err(RequestError::Unclassified(anyhow::anyhow!(
                "{} is not a write operation",
                operation
            )));
        }
        let table = self.schema.table_name();
        let pk_column = self.schema.pk_column();

        let claims = self.ctx.validator.authenticate(&envelope.security).await?;
        *caller = claims.subject().map(str::to_owned);

        let mut row = self.schema.to_row(&envelope.payload)?;
        let existing = row.get(pk_column).filter(|v| !v.is_null()).cloned();
        let pk_value = match existing {
            Some(value) => value,
            None if operation == Operation::Create => {
                let id = Value::String(uuid::Uuid::new_v4().to_string());
                row.insert(pk_column.to_string(), id.clone());
                id
            }
            None => {
                return Err(RequestError::InputShapeInvalid(format!(
                    "missing primary key '{}'",
                    pk_column
                )))
            }
        };

        let required = self.schema.required_fields(operation, Some(&row));
        self.authorize(operation, &required, &claims)?;

        let statement = WriteStatement {
            table: table.to_string(),
            operation,
            pk_column: pk_column.to_string(),
            pk_value: pk_value.clone(),
            row,
            sys_columns: SysColumns::from_envelope(
                caller.as_deref(),
                &envelope.context,
                &envelope.security,
            ),
            expectation: self.schema.precondition(operation),
        };
        let result = self.ctx.port.write(&statement).await.map_err(|e| {
            RequestError::DataAccess(format!(
                "Couldn't {} table '{}': {}",
                write_verb(operation),
                table,
                e
            ))
        })?;

        let key = value_key(&pk_value);
        match result {
            WriteResult::Applied => {
                debug!(table, %operation, key = %key, "Write applied");
                Ok((operation == Operation::Create).then(|| EntityId::new(key)))
            }
            WriteResult::PreconditionFailed if operation == Operation::Create => Err(
                RequestError::ConstraintViolation(format!(
                    "Record '{}' already exists in table '{}'",
                    key, table
                )),
            ),
            WriteResult::PreconditionFailed => Err(RequestError::NotFound(format!(
                "Record '{}' not found in table '{}'",
                key, table
            ))),
        }
    }

    fn authorize(
        &self,
        operation: Operation,
        required: &[FieldPermission],
        claims: &Claims,
    ) -> Result<(), RequestError> {
        if self.ctx.access.has_access(operation, required, claims) {
            Ok(())
        } else {
            Err(RequestError::ForbiddenOperation(format!(
                "User has invalid role for {} on table {}",
                operation,
                self.schema.table_name()
            )))
        }
    }

    fn report<T>(
        &self,
        operation: Operation,
        caller: Option<String>,
        result: &Result<T, RequestError>,
    ) {
        let outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(e) => AuditOutcome::Failure {
                status: e.status(),
                details: e.details(),
            },
        };
        self.ctx.audit.record(&AuditEvent::new(
            operation,
            self.schema.table_name(),
            caller,
            outcome,
        ));
    }
}

fn write_verb(operation: Operation) -> &'static str {
    match operation {
        Operation::Delete => "delete from",
        _ => "write to",
    }
}
