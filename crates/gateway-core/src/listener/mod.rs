//! Inbound side: pre-dispatch validation and the dispatch listener.

pub mod dispatch;
pub mod validation;

pub use dispatch::{DispatchListener, RequestProcessor};
pub use validation::{AcceptAll, RequiredFields, SignatureRequired, ValidatorChain};
