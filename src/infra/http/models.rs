//! Request/response bodies. File bytes cross the HTTP boundary as
//! standard base64; storage and the domain carry raw bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::workflow::ApplicationView;
use crate::domain::applications::ApplicationRecord;
use crate::domain::documents::DocumentRecord;
use crate::domain::payments::{PaymentProof, PaymentRecord};

use super::error::ApiError;

pub fn decode_base64(value: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(value)
        .map_err(|err| ApiError::bad_request("file content is not valid base64", Some(err.to_string())))
}

#[derive(Debug, Deserialize)]
pub struct SubmitBuildingRequest {
    pub payload: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOccupancyRequest {
    /// Parent building permit, as an application id or reference number.
    pub building_permit: String,
    pub payload: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    pub comments: Option<String>,
    #[serde(default)]
    pub missing_documents: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded bytes.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount_centavos: i64,
    pub method: String,
    pub reference_code: Option<String>,
    pub proof: Option<FilePayload>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentUploadRequest {
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded bytes.
    pub content: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevisionFile {
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded bytes.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RevisionRequest {
    pub files: Vec<RevisionFile>,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistItemRef {
    pub category: String,
    pub item: String,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistFlagRequest {
    pub items: Vec<ChecklistItemRef>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistResolveRequest {
    pub items: Vec<ChecklistItemRef>,
}

/// Ledger row metadata; bytes are fetched positionally.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: String,
    pub uploaded_by_role: Option<String>,
    pub original_index: i32,
    pub notes: Option<String>,
    pub uploaded_at: OffsetDateTime,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            requirement_name: record.requirement_name,
            file_name: record.file_name,
            content_type: record.content_type,
            size_bytes: record.content.len() as u64,
            uploaded_by: record.uploaded_by.as_str().to_string(),
            uploaded_by_role: record
                .uploaded_by_role
                .map(|office| office.as_str().to_string()),
            original_index: record.original_index,
            notes: record.notes,
            uploaded_at: record.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentContentResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    /// Base64-encoded bytes.
    pub content: String,
}

impl From<DocumentRecord> for DocumentContentResponse {
    fn from(record: DocumentRecord) -> Self {
        let content = BASE64.encode(&record.content);
        Self {
            document: record.into(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub amount_centavos: i64,
    pub method: String,
    pub reference_code: Option<String>,
    pub status: String,
    pub has_proof: bool,
    pub submitted_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(record: PaymentRecord) -> Self {
        Self {
            id: record.id,
            application_id: record.application_id,
            amount_centavos: record.amount_centavos,
            method: record.method.as_str().to_string(),
            reference_code: record.reference_code,
            status: record.status.as_str().to_string(),
            has_proof: record.proof.is_some(),
            submitted_at: record.submitted_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentProofResponse {
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded bytes.
    pub content: String,
}

impl From<PaymentProof> for PaymentProofResponse {
    fn from(proof: PaymentProof) -> Self {
        Self {
            file_name: proof.file_name,
            content_type: proof.content_type,
            content: BASE64.encode(&proof.content),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationViewResponse {
    #[serde(flatten)]
    pub application: ApplicationRecord,
    pub documents: Vec<DocumentResponse>,
    pub payment: Option<PaymentResponse>,
}

impl From<ApplicationView> for ApplicationViewResponse {
    fn from(view: ApplicationView) -> Self {
        Self {
            application: view.application,
            documents: view.documents.into_iter().map(Into::into).collect(),
            payment: view.payment.map(Into::into),
        }
    }
}
