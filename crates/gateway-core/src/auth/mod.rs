//! Authentication and authorization: realm keys, token validation and the
//! role-based access policy.

pub mod access;
pub mod key_resolver;
pub mod token_validator;

pub use access::RoleAccessEvaluator;
pub use key_resolver::{KeyCache, KeyResolver, RealmPublicKey};
pub use token_validator::TokenValidator;
