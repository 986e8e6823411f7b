//! Permit application aggregate and its sub-records.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::checklist::AdminChecklist;
use crate::domain::types::{ApplicationStatus, ApplicationType};

/// One audit entry in the append-only workflow history. Entries are never
/// mutated or reordered; each accepted transition appends exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub status: ApplicationStatus,
    pub comments: String,
    pub updated_by: String,
    pub timestamp: OffsetDateTime,
}

/// Mutable rejection sub-record. `is_resolved == false` or a non-empty
/// missing-documents list blocks forward-progress transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionDetails {
    pub comments: String,
    pub missing_documents: Vec<String>,
    pub is_resolved: bool,
}

impl RejectionDetails {
    /// The cleared state written when an application (re)enters intake.
    pub fn resolved_empty() -> Self {
        Self {
            comments: String::new(),
            missing_documents: Vec::new(),
            is_resolved: true,
        }
    }

    pub fn rejected(comments: impl Into<String>, missing_documents: Vec<String>) -> Self {
        Self {
            comments: comments.into(),
            missing_documents,
            is_resolved: false,
        }
    }

    pub fn has_unresolved_flags(&self) -> bool {
        !self.missing_documents.is_empty() || !self.is_resolved
    }
}

impl Default for RejectionDetails {
    fn default() -> Self {
        Self::resolved_empty()
    }
}

/// Final issuance record. Written exactly once; `permit_number` is
/// immutable after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitRecord {
    pub permit_number: String,
    pub issued_at: OffsetDateTime,
    pub issued_by: String,
}

/// A building or occupancy permit application.
///
/// The type-specific form payload (box1–box6 for building,
/// permit-info/owner/project/signature sections for occupancy) is opaque
/// to the workflow engine and carried as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub application_type: ApplicationType,
    pub reference_no: String,
    pub applicant: String,
    pub status: ApplicationStatus,
    pub workflow_history: Vec<WorkflowEntry>,
    pub rejection_details: RejectionDetails,
    pub admin_checklist: AdminChecklist,
    pub permit: Option<PermitRecord>,
    /// Parent building permit, present on occupancy applications only.
    pub building_permit_id: Option<Uuid>,
    pub payload: JsonValue,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// Optimistic-concurrency counter bumped on every write.
    pub revision: i64,
}

impl ApplicationRecord {
    pub fn has_issued_permit(&self) -> bool {
        self.permit
            .as_ref()
            .is_some_and(|permit| !permit.permit_number.is_empty())
    }
}
