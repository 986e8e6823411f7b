//! Document ledger records and read-time visibility.
//!
//! The ledger is append-only: replacing a requirement soft-deletes the
//! old row and inserts a new one carrying the same `original_index`, so
//! positional references held by callers stay valid across replacement.
//! Visibility is a pure predicate applied at read time; writes never
//! consult it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{
    ApplicationStatus, ApplicationType, RequesterRole, ReviewOffice, Uploader,
};

/// One row of the document ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub application_id: Uuid,
    pub application_type: ApplicationType,
    /// Requirement this file satisfies ("Locational Clearance", ...).
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub content: Vec<u8>,
    pub uploaded_by: Uploader,
    /// Office of the uploading admin; `None` for user and system uploads.
    pub uploaded_by_role: Option<ReviewOffice>,
    /// Stable position within the application's ledger. Survives
    /// replacement; never reused while the application lives.
    pub original_index: i32,
    pub is_active: bool,
    pub notes: Option<String>,
    pub uploaded_at: OffsetDateTime,
}

impl DocumentRecord {
    pub fn is_admin_upload(&self) -> bool {
        matches!(self.uploaded_by, Uploader::Admin)
    }
}

/// Whether `requester` may see `document` given the owning application's
/// current status.
///
/// Applicants see their own and system uploads always, and office uploads
/// only once the application reaches `Approved` or `Permit Issued`. The
/// MEO sees everything; the BFP sees office uploads from MEO and BFP; the
/// Mayor's office sees office uploads from all three desks.
pub fn visible_to(
    document: &DocumentRecord,
    requester: RequesterRole,
    status: ApplicationStatus,
) -> bool {
    if !document.is_admin_upload() {
        return true;
    }

    match requester {
        RequesterRole::MeoAdmin => true,
        RequesterRole::BfpAdmin => matches!(
            document.uploaded_by_role,
            Some(ReviewOffice::Meo) | Some(ReviewOffice::Bfp)
        ),
        RequesterRole::MayorAdmin => document.uploaded_by_role.is_some(),
        RequesterRole::Applicant => matches!(
            status,
            ApplicationStatus::Approved | ApplicationStatus::PermitIssued
        ),
    }
}

/// Filter a ledger listing for one requester. Order is preserved.
pub fn filter_for_requester(
    documents: Vec<DocumentRecord>,
    requester: RequesterRole,
    status: ApplicationStatus,
) -> Vec<DocumentRecord> {
    documents
        .into_iter()
        .filter(|doc| visible_to(doc, requester, status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn doc(uploaded_by: Uploader, role: Option<ReviewOffice>) -> DocumentRecord {
        DocumentRecord {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            application_type: ApplicationType::Building,
            requirement_name: "Locational Clearance".into(),
            file_name: "clearance.pdf".into(),
            content_type: "application/pdf".into(),
            content: Vec::new(),
            uploaded_by,
            uploaded_by_role: role,
            original_index: 0,
            is_active: true,
            notes: None,
            uploaded_at: datetime!(2025-05-10 09:00 UTC),
        }
    }

    fn ledger() -> Vec<DocumentRecord> {
        vec![
            doc(Uploader::User, None),
            doc(Uploader::System, None),
            doc(Uploader::Admin, Some(ReviewOffice::Meo)),
            doc(Uploader::Admin, Some(ReviewOffice::Bfp)),
            doc(Uploader::Admin, Some(ReviewOffice::Mayor)),
        ]
    }

    fn visible_count(requester: RequesterRole, status: ApplicationStatus) -> usize {
        filter_for_requester(ledger(), requester, status).len()
    }

    #[test]
    fn meo_admin_sees_everything() {
        assert_eq!(visible_count(RequesterRole::MeoAdmin, ApplicationStatus::PendingMeo), 5);
    }

    #[test]
    fn bfp_admin_sees_meo_and_bfp_office_uploads_only() {
        let visible = filter_for_requester(
            ledger(),
            RequesterRole::BfpAdmin,
            ApplicationStatus::PendingBfp,
        );
        assert_eq!(visible.len(), 4);
        assert!(
            visible
                .iter()
                .all(|doc| doc.uploaded_by_role != Some(ReviewOffice::Mayor))
        );
    }

    #[test]
    fn mayor_admin_sees_all_office_uploads() {
        assert_eq!(
            visible_count(RequesterRole::MayorAdmin, ApplicationStatus::PendingMayor),
            5
        );
    }

    #[test]
    fn applicant_sees_office_uploads_only_after_approval() {
        for status in [
            ApplicationStatus::Submitted,
            ApplicationStatus::PendingMeo,
            ApplicationStatus::PendingBfp,
            ApplicationStatus::PendingMayor,
            ApplicationStatus::Rejected,
            ApplicationStatus::PaymentPending,
            ApplicationStatus::PaymentSubmitted,
        ] {
            assert_eq!(visible_count(RequesterRole::Applicant, status), 2);
        }
        assert_eq!(
            visible_count(RequesterRole::Applicant, ApplicationStatus::Approved),
            5
        );
        assert_eq!(
            visible_count(RequesterRole::Applicant, ApplicationStatus::PermitIssued),
            5
        );
    }

    #[test]
    fn filtering_preserves_ledger_order() {
        let visible = filter_for_requester(
            ledger(),
            RequesterRole::Applicant,
            ApplicationStatus::PendingMeo,
        );
        assert_eq!(visible[0].uploaded_by, Uploader::User);
        assert_eq!(visible[1].uploaded_by, Uploader::System);
    }
}
