//! In-memory repository fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use serde_json::{Value as JsonValue, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use permiso::application::documents::DocumentUpload;
use permiso::application::repos::{
    ApplicationsRepo, ChecklistSave, DocumentsRepo, NewApplicationParams, NewDocumentParams,
    PaymentUpsertParams, PaymentsRepo, RepoError, TransitionUpdate,
};
use permiso::application::workflow::Actor;
use permiso::domain::applications::{ApplicationRecord, RejectionDetails};
use permiso::domain::documents::DocumentRecord;
use permiso::domain::payments::PaymentRecord;
use permiso::domain::permit_numbers;
use permiso::domain::types::{
    ApplicationStatus, ApplicationType, PaymentStatus, RequesterRole, ReviewOffice, Uploader,
};
use permiso::infra::http::{self, AppState};

#[derive(Default)]
pub struct InMemoryApplications {
    apps: Mutex<HashMap<Uuid, ApplicationRecord>>,
    next_reference: AtomicU32,
    /// Pending `save_checklist` calls to fail with a write conflict.
    checklist_conflicts: AtomicU32,
}

impl InMemoryApplications {
    /// Make the next `count` checklist saves lose the revision race.
    pub fn inject_checklist_conflicts(&self, count: u32) {
        self.checklist_conflicts.store(count, Ordering::SeqCst);
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<ApplicationRecord> {
        self.apps.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl ApplicationsRepo for InMemoryApplications {
    async fn create(&self, params: NewApplicationParams) -> Result<ApplicationRecord, RepoError> {
        let sequence = self.next_reference.fetch_add(1, Ordering::SeqCst) + 1;
        let reference_no = format!(
            "{}-{:02}-{:06}",
            params.application_type.reference_prefix(),
            params.created_at.year() % 100,
            sequence
        );
        let record = ApplicationRecord {
            id: params.id,
            application_type: params.application_type,
            reference_no,
            applicant: params.applicant,
            status: ApplicationStatus::Submitted,
            workflow_history: vec![params.initial_entry],
            rejection_details: RejectionDetails::resolved_empty(),
            admin_checklist: params.admin_checklist,
            permit: None,
            building_permit_id: params.building_permit_id,
            payload: params.payload,
            created_at: params.created_at,
            updated_at: params.created_at,
            revision: 1,
        };
        self.apps.lock().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicationRecord>, RepoError> {
        Ok(self.apps.lock().await.get(&id).cloned())
    }

    async fn find_by_reference(
        &self,
        reference_no: &str,
    ) -> Result<Option<ApplicationRecord>, RepoError> {
        Ok(self
            .apps
            .lock()
            .await
            .values()
            .find(|app| app.reference_no.eq_ignore_ascii_case(reference_no))
            .cloned())
    }

    async fn list_for_applicant(
        &self,
        applicant: &str,
    ) -> Result<Vec<ApplicationRecord>, RepoError> {
        let mut matched: Vec<_> = self
            .apps
            .lock()
            .await
            .values()
            .filter(|app| app.applicant == applicant)
            .cloned()
            .collect();
        matched.sort_by_key(|app| app.created_at);
        Ok(matched)
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>, RepoError> {
        let mut all: Vec<_> = self.apps.lock().await.values().cloned().collect();
        all.sort_by_key(|app| app.created_at);
        Ok(all)
    }

    async fn apply_transition(
        &self,
        update: TransitionUpdate,
    ) -> Result<ApplicationRecord, RepoError> {
        let mut apps = self.apps.lock().await;
        let record = apps.get_mut(&update.id).ok_or(RepoError::NotFound)?;
        record.status = update.status;
        if let Some(details) = update.rejection_details {
            record.rejection_details = details;
        }
        if let Some(permit) = update.permit {
            record.permit = Some(permit);
        }
        record.workflow_history.push(update.history_entry);
        record.updated_at = update.updated_at;
        record.revision += 1;
        Ok(record.clone())
    }

    async fn save_checklist(&self, save: ChecklistSave) -> Result<ApplicationRecord, RepoError> {
        let pending = self.checklist_conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.checklist_conflicts.store(pending - 1, Ordering::SeqCst);
            return Err(RepoError::Conflict);
        }

        let mut apps = self.apps.lock().await;
        let record = apps.get_mut(&save.id).ok_or(RepoError::NotFound)?;
        if record.revision != save.expected_revision {
            return Err(RepoError::Conflict);
        }
        record.admin_checklist = save.admin_checklist;
        record.rejection_details = save.rejection_details;
        record.status = save.status;
        if let Some(entry) = save.history_entry {
            record.workflow_history.push(entry);
        }
        record.updated_at = save.updated_at;
        record.revision += 1;
        Ok(record.clone())
    }

    async fn max_permit_sequence(
        &self,
        application_type: ApplicationType,
        period_key: &str,
    ) -> Result<Option<u32>, RepoError> {
        Ok(self
            .apps
            .lock()
            .await
            .values()
            .filter(|app| app.application_type == application_type)
            .filter_map(|app| app.permit.as_ref())
            .filter_map(|permit| permit_numbers::sequence_of(&permit.permit_number, period_key))
            .max())
    }
}

#[derive(Default)]
pub struct InMemoryDocuments {
    docs: Mutex<Vec<DocumentRecord>>,
}

impl InMemoryDocuments {
    pub async fn all_rows(&self, application_id: Uuid) -> Vec<DocumentRecord> {
        self.docs
            .lock()
            .await
            .iter()
            .filter(|doc| doc.application_id == application_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentsRepo for InMemoryDocuments {
    async fn append(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError> {
        let mut docs = self.docs.lock().await;
        let next_index = docs
            .iter()
            .filter(|doc| doc.application_id == params.application_id)
            .map(|doc| doc.original_index)
            .max()
            .map_or(0, |max| max + 1);
        let record = new_document(params, next_index);
        docs.push(record.clone());
        Ok(record)
    }

    async fn replace(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError> {
        let mut docs = self.docs.lock().await;
        let index = match docs.iter_mut().find(|doc| {
            doc.application_id == params.application_id
                && doc.requirement_name == params.requirement_name
                && doc.is_active
        }) {
            Some(existing) => {
                existing.is_active = false;
                existing.original_index
            }
            None => docs
                .iter()
                .filter(|doc| doc.application_id == params.application_id)
                .map(|doc| doc.original_index)
                .max()
                .map_or(0, |max| max + 1),
        };
        let record = new_document(params, index);
        docs.push(record.clone());
        Ok(record)
    }

    async fn find_active_by_index(
        &self,
        application_id: Uuid,
        original_index: i32,
    ) -> Result<Option<DocumentRecord>, RepoError> {
        Ok(self
            .docs
            .lock()
            .await
            .iter()
            .find(|doc| {
                doc.application_id == application_id
                    && doc.original_index == original_index
                    && doc.is_active
            })
            .cloned())
    }

    async fn list_active(&self, application_id: Uuid) -> Result<Vec<DocumentRecord>, RepoError> {
        let mut active: Vec<_> = self
            .docs
            .lock()
            .await
            .iter()
            .filter(|doc| doc.application_id == application_id && doc.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|doc| doc.original_index);
        Ok(active)
    }

    async fn count_office_documents(
        &self,
        application_id: Uuid,
        office: ReviewOffice,
    ) -> Result<u64, RepoError> {
        Ok(self
            .docs
            .lock()
            .await
            .iter()
            .filter(|doc| {
                doc.application_id == application_id
                    && doc.is_active
                    && doc.uploaded_by == Uploader::Admin
                    && doc.uploaded_by_role == Some(office)
            })
            .count() as u64)
    }
}

fn new_document(params: NewDocumentParams, original_index: i32) -> DocumentRecord {
    DocumentRecord {
        id: Uuid::new_v4(),
        application_id: params.application_id,
        application_type: params.application_type,
        requirement_name: params.requirement_name,
        file_name: params.file_name,
        content_type: params.content_type,
        content: params.content,
        uploaded_by: params.uploaded_by,
        uploaded_by_role: params.uploaded_by_role,
        original_index,
        is_active: true,
        notes: params.notes,
        uploaded_at: params.uploaded_at,
    }
}

#[derive(Default)]
pub struct InMemoryPayments {
    payments: Mutex<HashMap<Uuid, PaymentRecord>>,
}

#[async_trait]
impl PaymentsRepo for InMemoryPayments {
    async fn upsert(&self, params: PaymentUpsertParams) -> Result<PaymentRecord, RepoError> {
        let mut payments = self.payments.lock().await;
        let id = payments
            .get(&params.application_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let record = PaymentRecord {
            id,
            application_id: params.application_id,
            application_type: params.application_type,
            amount_centavos: params.amount_centavos,
            method: params.method,
            reference_code: params.reference_code,
            proof: params.proof,
            status: PaymentStatus::Pending,
            submitted_at: params.submitted_at,
            updated_at: params.submitted_at,
        };
        payments.insert(params.application_id, record.clone());
        Ok(record)
    }

    async fn find_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<PaymentRecord>, RepoError> {
        Ok(self.payments.lock().await.get(&application_id).cloned())
    }

    async fn set_status(
        &self,
        application_id: Uuid,
        status: PaymentStatus,
        updated_at: time::OffsetDateTime,
    ) -> Result<PaymentRecord, RepoError> {
        let mut payments = self.payments.lock().await;
        let record = payments.get_mut(&application_id).ok_or(RepoError::NotFound)?;
        record.status = status;
        record.updated_at = updated_at;
        Ok(record.clone())
    }
}

/// Services wired over the fakes, with direct handles kept for
/// assertions and conflict injection.
pub struct TestContext {
    pub state: AppState,
    pub applications: Arc<InMemoryApplications>,
    pub documents: Arc<InMemoryDocuments>,
    pub payments: Arc<InMemoryPayments>,
}

impl TestContext {
    pub fn new() -> Self {
        let applications = Arc::new(InMemoryApplications::default());
        let documents = Arc::new(InMemoryDocuments::default());
        let payments = Arc::new(InMemoryPayments::default());
        let state = AppState::from_repos(
            applications.clone(),
            documents.clone(),
            payments.clone(),
            None,
        );
        Self {
            state,
            applications,
            documents,
            payments,
        }
    }

    pub fn router(&self) -> Router {
        http::build_router(self.state.clone())
    }
}

pub fn applicant() -> Actor {
    Actor::new("juan.delacruz", RequesterRole::Applicant)
}

/// An unrelated applicant, for ownership checks.
pub fn other_applicant() -> Actor {
    Actor::new("maria.santos", RequesterRole::Applicant)
}

pub fn meo_admin() -> Actor {
    Actor::new("meo.reviewer", RequesterRole::MeoAdmin)
}

pub fn bfp_admin() -> Actor {
    Actor::new("bfp.inspector", RequesterRole::BfpAdmin)
}

pub fn mayor_admin() -> Actor {
    Actor::new("mayor.clerk", RequesterRole::MayorAdmin)
}

pub fn building_payload() -> JsonValue {
    json!({
        "box1": { "owner": "Juan Dela Cruz", "location": "Poblacion" },
        "box2": { "scope_of_work": "New Construction" }
    })
}

pub fn occupancy_payload() -> JsonValue {
    json!({
        "permit_info": { "use_type": "Residential" },
        "owner": { "name": "Juan Dela Cruz" }
    })
}

pub async fn submit_building(ctx: &TestContext) -> ApplicationRecord {
    ctx.state
        .workflow
        .submit_building(&applicant(), building_payload())
        .await
        .expect("building submission succeeds")
}

/// Drive one transition as `actor`, panicking on rejection.
pub async fn advance(
    ctx: &TestContext,
    id: Uuid,
    status: &str,
    actor: &Actor,
) -> ApplicationRecord {
    ctx.state
        .workflow
        .apply_transition(id, status, actor, Default::default())
        .await
        .unwrap_or_else(|err| panic!("transition to `{status}` failed: {err}"))
}

/// Upload one admin document for the actor's office, satisfying the
/// document gate for that desk.
pub async fn upload_office_document(ctx: &TestContext, id: Uuid, actor: &Actor) -> DocumentRecord {
    ctx.state
        .documents
        .append(
            id,
            actor,
            DocumentUpload {
                requirement_name: format!("{} Endorsement", actor.id),
                file_name: "endorsement.pdf".into(),
                content_type: "application/pdf".into(),
                content: b"%PDF-1.4 endorsement".to_vec(),
                notes: None,
            },
        )
        .await
        .expect("office document upload succeeds")
}

/// Build an authenticated JSON request carrying the gateway identity
/// headers.
pub fn authed_request(
    method: &str,
    uri: &str,
    actor_id: &str,
    role: &str,
    body: Option<JsonValue>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor-id", actor_id)
        .header("x-actor-role", role)
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(json) => builder
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub async fn response_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
