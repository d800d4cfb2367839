//! Generic CRUD pipeline and the handlers built on it.

pub mod operations;
pub mod pipeline;
pub mod schema;

pub use operations::{CommandHandler, ReadHandler};
pub use pipeline::{EntityPipeline, HandlerContext};
pub use schema::{column_name, field_name, EntitySchema};
