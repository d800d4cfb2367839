//! Operation handlers: one read handler and three command handlers per
//! entity, all thin adapters over `EntityPipeline`.

use super::pipeline::{EntityPipeline, HandlerContext};
use super::schema::EntitySchema;
use crate::domain::{Operation, RequestError};
use crate::ports::{HandlerOutcome, OperationHandler};
use async_trait::async_trait;
use shared_types::{EntityId, Envelope};
use std::sync::Arc;

/// Primary-key read.
pub struct ReadHandler<E: EntitySchema> {
    pipeline: EntityPipeline<E>,
}

impl<E: EntitySchema> ReadHandler<E> {
    pub fn new(schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self {
            pipeline: EntityPipeline::new(schema, ctx),
        }
    }
}

#[async_trait]
impl<E: EntitySchema> OperationHandler for ReadHandler<E> {
    type Input = E::Id;
    type Output = E::Record;

    fn operation(&self) -> Operation {
        Operation::Read
    }

    fn table_name(&self) -> &str {
        self.pipeline.schema().table_name()
    }

    async fn handle(
        &self,
        envelope: &Envelope<E::Id>,
    ) -> Result<HandlerOutcome<E::Record>, RequestError> {
        Ok(match self.pipeline.read(envelope).await? {
            Some(record) => HandlerOutcome::Found(record),
            None => HandlerOutcome::NotFound,
        })
    }
}

/// Create, update or delete of a whole record.
pub struct CommandHandler<E: EntitySchema> {
    operation: Operation,
    pipeline: EntityPipeline<E>,
}

impl<E: EntitySchema> CommandHandler<E> {
    pub fn create(schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self::with_operation(Operation::Create, schema, ctx)
    }

    pub fn update(schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self::with_operation(Operation::Update, schema, ctx)
    }

    pub fn delete(schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self::with_operation(Operation::Delete, schema, ctx)
    }

    fn with_operation(operation: Operation, schema: Arc<E>, ctx: HandlerContext) -> Self {
        Self {
            operation,
            pipeline: EntityPipeline::new(schema, ctx),
        }
    }
}

#[async_trait]
impl<E: EntitySchema> OperationHandler for CommandHandler<E> {
    type Input = E::Record;
    type Output = EntityId;

    fn operation(&self) -> Operation {
        self.operation
    }

    fn table_name(&self) -> &str {
        self.pipeline.schema().table_name()
    }

    async fn handle(
        &self,
        envelope: &Envelope<E::Record>,
    ) -> Result<HandlerOutcome<EntityId>, RequestError> {
        let id = self.pipeline.write(self.operation, envelope).await?;
        Ok(HandlerOutcome::Written(id))
    }
}
