//! Pre-dispatch input validators.

use crate::handler::column_name;
use crate::ports::{InputValidator, ValidationVerdict};
use serde::Serialize;
use serde_json::Value;
use shared_types::{Envelope, Status};
use std::sync::Arc;

/// Accepts every envelope.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl<P> InputValidator<P> for AcceptAll {
    fn validate(&self, _key: &str, _envelope: &Envelope<P>) -> ValidationVerdict {
        ValidationVerdict::valid()
    }
}

/// Requires named payload fields to be present and non-null.
///
/// Field names may be given in wire (camelCase) or column (snake_case) form.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Serialize> InputValidator<P> for RequiredFields {
    fn validate(&self, _key: &str, envelope: &Envelope<P>) -> ValidationVerdict {
        let payload = match serde_json::to_value(&envelope.payload) {
            Ok(Value::Object(payload)) => payload,
            Ok(_) => return ValidationVerdict::invalid("payload must be an object"),
            Err(e) => return ValidationVerdict::invalid(format!("payload unreadable: {}", e)),
        };

        let present = |wanted: &str| {
            payload
                .iter()
                .any(|(name, value)| !value.is_null() && column_name(name) == column_name(wanted))
        };
        let missing: Vec<&str> = self
            .fields
            .iter()
            .map(String::as_str)
            .filter(|field| !present(field))
            .collect();

        if missing.is_empty() {
            ValidationVerdict::valid()
        } else {
            ValidationVerdict::invalid(format!("missing required fields: {}", missing.join(", ")))
        }
    }
}

/// Requires the envelope to carry a digital signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureRequired;

impl<P> InputValidator<P> for SignatureRequired {
    fn validate(&self, _key: &str, envelope: &Envelope<P>) -> ValidationVerdict {
        match envelope.security.digital_signature.as_deref() {
            Some(sig) if !sig.trim().is_empty() => ValidationVerdict::valid(),
            _ => ValidationVerdict::rejected(
                Status::ValidationError,
                "digital signature is required",
            ),
        }
    }
}

/// Runs validators in order; the first rejection wins.
pub struct ValidatorChain<P> {
    validators: Vec<Arc<dyn InputValidator<P>>>,
}

impl<P> Default for ValidatorChain<P> {
    fn default() -> Self {
        Self {
            validators: Vec::new(),
        }
    }
}

impl<P> ValidatorChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, validator: Arc<dyn InputValidator<P>>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<P> InputValidator<P> for ValidatorChain<P> {
    fn validate(&self, key: &str, envelope: &Envelope<P>) -> ValidationVerdict {
        self.validators
            .iter()
            .map(|v| v.validate(key, envelope))
            .find(|verdict| !verdict.valid)
            .unwrap_or_else(ValidationVerdict::valid)
    }
}
