//! Entities served by this gateway.

use gateway_core::listener::{AcceptAll, RequiredFields, ValidatorChain};
use gateway_core::{Condition, EntitySchema, InputValidator};
use serde::{Deserialize, Serialize};
use shared_types::{EntityId, Envelope, FileRef};
use std::sync::Arc;

/// A data subject's consent to one processing purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject_id: String,
    pub purpose: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_at: Option<String>,
    /// Signed consent form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<FileRef>,
    #[serde(default)]
    pub archived: bool,
}

/// Storage layout of `Consent`. Archived consents are invisible to reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsentSchema;

impl ConsentSchema {
    pub const ENTITY: &'static str = "consent";
}

impl EntitySchema for ConsentSchema {
    type Record = Consent;
    type Id = EntityId;

    fn table_name(&self) -> &str {
        Self::ENTITY
    }

    fn pk_column(&self) -> &str {
        "id"
    }

    fn columns(&self) -> &[&'static str] {
        &[
            "id",
            "subject_id",
            "purpose",
            "status",
            "granted_at",
            "evidence",
            "archived",
        ]
    }

    fn file_columns(&self) -> &[&'static str] {
        &["evidence"]
    }

    fn read_condition(&self, _envelope: &Envelope<EntityId>) -> Condition {
        Condition::eq("archived", false)
    }
}

/// Input validation for consent reads.
pub fn consent_read_validator() -> Arc<dyn InputValidator<EntityId>> {
    Arc::new(AcceptAll)
}

/// Input validation for consent writes.
pub fn consent_write_validator() -> Arc<dyn InputValidator<Consent>> {
    Arc::new(
        ValidatorChain::new().with(Arc::new(RequiredFields::new([
            "subjectId",
            "purpose",
            "status",
        ]))),
    )
}
