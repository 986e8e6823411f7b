//! Payment ledger records.
//!
//! One active payment per application. A resubmission overwrites the
//! mutable fields of the existing row rather than appending, so the
//! ledger never carries stale proofs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{ApplicationType, PaymentMethod, PaymentStatus};

/// Uploaded proof-of-payment image or receipt scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub content: Vec<u8>,
}

/// The single payment row attached to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub application_id: Uuid,
    pub application_type: ApplicationType,
    pub amount_centavos: i64,
    pub method: PaymentMethod,
    /// Bank or wallet reference, required for online payments.
    pub reference_code: Option<String>,
    pub proof: Option<PaymentProof>,
    pub status: PaymentStatus,
    pub submitted_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PaymentRecord {
    pub fn is_verified(&self) -> bool {
        self.status == PaymentStatus::Verified
    }
}
