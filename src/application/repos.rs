//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::applications::{
    ApplicationRecord, PermitRecord, RejectionDetails, WorkflowEntry,
};
use crate::domain::checklist::AdminChecklist;
use crate::domain::documents::DocumentRecord;
use crate::domain::payments::{PaymentProof, PaymentRecord};
use crate::domain::types::{
    ApplicationStatus, ApplicationType, PaymentMethod, PaymentStatus, ReviewOffice, Uploader,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("write conflict: concurrent update won")]
    Conflict,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewApplicationParams {
    pub id: Uuid,
    pub application_type: ApplicationType,
    pub applicant: String,
    pub payload: JsonValue,
    pub building_permit_id: Option<Uuid>,
    pub admin_checklist: AdminChecklist,
    pub initial_entry: WorkflowEntry,
    pub created_at: OffsetDateTime,
}

/// One accepted transition, persisted as a single atomic write: the
/// status (and any sub-record changes) land together with exactly one
/// appended history entry, and the revision counter is bumped.
#[derive(Debug, Clone)]
pub struct TransitionUpdate {
    pub id: Uuid,
    pub status: ApplicationStatus,
    /// `Some` overwrites the rejection sub-record; `None` leaves it as
    /// stored.
    pub rejection_details: Option<RejectionDetails>,
    /// Set exactly once, on issuance.
    pub permit: Option<PermitRecord>,
    pub history_entry: WorkflowEntry,
    pub updated_at: OffsetDateTime,
}

/// Full-structure checklist save, guarded by a revision compare-and-swap.
/// A revision miss is reported as [`RepoError::Conflict`].
#[derive(Debug, Clone)]
pub struct ChecklistSave {
    pub id: Uuid,
    pub expected_revision: i64,
    pub admin_checklist: AdminChecklist,
    pub rejection_details: RejectionDetails,
    pub status: ApplicationStatus,
    /// Present when the save also moves the status (new flags force
    /// `Rejected`).
    pub history_entry: Option<WorkflowEntry>,
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait ApplicationsRepo: Send + Sync {
    /// Insert a new application, assigning its reference number from the
    /// shared sequence.
    async fn create(&self, params: NewApplicationParams) -> Result<ApplicationRecord, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicationRecord>, RepoError>;

    /// Reference lookup is case-insensitive.
    async fn find_by_reference(
        &self,
        reference_no: &str,
    ) -> Result<Option<ApplicationRecord>, RepoError>;

    async fn list_for_applicant(
        &self,
        applicant: &str,
    ) -> Result<Vec<ApplicationRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>, RepoError>;

    async fn apply_transition(
        &self,
        update: TransitionUpdate,
    ) -> Result<ApplicationRecord, RepoError>;

    async fn save_checklist(&self, save: ChecklistSave) -> Result<ApplicationRecord, RepoError>;

    /// Highest permit sequence already issued in `period_key` for one
    /// application type, parsed from stored permit numbers.
    async fn max_permit_sequence(
        &self,
        application_type: ApplicationType,
        period_key: &str,
    ) -> Result<Option<u32>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewDocumentParams {
    pub application_id: Uuid,
    pub application_type: ApplicationType,
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub uploaded_by: Uploader,
    pub uploaded_by_role: Option<ReviewOffice>,
    pub notes: Option<String>,
    pub uploaded_at: OffsetDateTime,
}

#[async_trait]
pub trait DocumentsRepo: Send + Sync {
    /// Insert at the next free `original_index` for the application.
    async fn append(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError>;

    /// Soft-delete the active row matching `params.requirement_name` and
    /// insert the replacement under the superseded row's `original_index`,
    /// in one transaction. When no active row matches, the replacement is
    /// appended at the next free index instead.
    async fn replace(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError>;

    async fn find_active_by_index(
        &self,
        application_id: Uuid,
        original_index: i32,
    ) -> Result<Option<DocumentRecord>, RepoError>;

    /// Active rows ordered by `original_index`.
    async fn list_active(&self, application_id: Uuid) -> Result<Vec<DocumentRecord>, RepoError>;

    /// Active admin uploads from `office`, used by the transition gates.
    async fn count_office_documents(
        &self,
        application_id: Uuid,
        office: ReviewOffice,
    ) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct PaymentUpsertParams {
    pub application_id: Uuid,
    pub application_type: ApplicationType,
    pub amount_centavos: i64,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub proof: Option<PaymentProof>,
    pub submitted_at: OffsetDateTime,
}

#[async_trait]
pub trait PaymentsRepo: Send + Sync {
    /// Insert or overwrite the single payment row for the application.
    /// Resubmission resets the status to `Pending`.
    async fn upsert(&self, params: PaymentUpsertParams) -> Result<PaymentRecord, RepoError>;

    async fn find_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<PaymentRecord>, RepoError>;

    async fn set_status(
        &self,
        application_id: Uuid,
        status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<PaymentRecord, RepoError>;
}
