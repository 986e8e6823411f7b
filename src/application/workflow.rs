//! Workflow engine: submissions and status transitions.
//!
//! Every accepted transition is persisted by the repository as one
//! atomic write combining the status change, any sub-record updates, and
//! exactly one appended history entry. Business-rule rejections happen
//! before that write, so a rejected request never mutates anything.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::WorkflowError;
use crate::application::permit_numbers::PermitNumberGenerator;
use crate::application::repos::{
    ApplicationsRepo, DocumentsRepo, NewApplicationParams, NewDocumentParams, PaymentUpsertParams,
    PaymentsRepo, TransitionUpdate,
};
use crate::domain::applications::{
    ApplicationRecord, PermitRecord, RejectionDetails, WorkflowEntry,
};
use crate::domain::checklist::AdminChecklist;
use crate::domain::documents::{self, DocumentRecord};
use crate::domain::payments::{PaymentProof, PaymentRecord};
use crate::domain::types::{
    ApplicationStatus, ApplicationType, PaymentMethod, RequesterRole, Uploader,
};
use crate::domain::workflow::{self, RejectionEffect};

/// Resolved caller identity, supplied by the upstream gateway.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: RequesterRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: RequesterRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Admins may act on any application; applicants only on their own.
    pub fn may_access(&self, application: &ApplicationRecord) -> bool {
        self.role.is_admin() || application.applicant == self.id
    }
}

/// A filled application form produced by the rendering collaborator.
#[derive(Debug, Clone)]
pub struct RenderedForm {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// PDF form-filling collaborator. Rendering is best-effort: a failure is
/// logged and the submission proceeds without the generated document.
#[async_trait]
pub trait FormRenderer: Send + Sync {
    async fn render_application_form(
        &self,
        application: &ApplicationRecord,
    ) -> Result<RenderedForm, WorkflowError>;
}

/// Caller-supplied detail accompanying a transition request.
#[derive(Debug, Clone, Default)]
pub struct TransitionCommand {
    pub comments: Option<String>,
    /// Labels recorded as missing when the target is `Rejected`.
    pub missing_documents: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentSubmission {
    pub amount_centavos: i64,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub proof: Option<PaymentProof>,
}

/// One uploaded file accompanying a revision resubmission.
#[derive(Debug, Clone)]
pub struct RevisionUpload {
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An application enriched for one requester: ordered documents after
/// the visibility filter, plus payment details.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: ApplicationRecord,
    pub documents: Vec<DocumentRecord>,
    pub payment: Option<PaymentRecord>,
}

#[derive(Clone)]
pub struct WorkflowService {
    applications: Arc<dyn ApplicationsRepo>,
    documents: Arc<dyn DocumentsRepo>,
    payments: Arc<dyn PaymentsRepo>,
    permit_numbers: PermitNumberGenerator,
    form_renderer: Option<Arc<dyn FormRenderer>>,
}

impl WorkflowService {
    pub fn new(
        applications: Arc<dyn ApplicationsRepo>,
        documents: Arc<dyn DocumentsRepo>,
        payments: Arc<dyn PaymentsRepo>,
        form_renderer: Option<Arc<dyn FormRenderer>>,
    ) -> Self {
        let permit_numbers = PermitNumberGenerator::new(Arc::clone(&applications));
        Self {
            applications,
            documents,
            payments,
            permit_numbers,
            form_renderer,
        }
    }

    pub async fn submit_building(
        &self,
        actor: &Actor,
        payload: JsonValue,
    ) -> Result<ApplicationRecord, WorkflowError> {
        self.submit(actor, ApplicationType::Building, None, payload)
            .await
    }

    pub async fn submit_occupancy(
        &self,
        actor: &Actor,
        building_permit_identifier: &str,
        payload: JsonValue,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let parent = self
            .resolve_application(building_permit_identifier)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !actor.may_access(&parent) {
            return Err(WorkflowError::forbidden(actor.role));
        }
        if parent.application_type != ApplicationType::Building {
            return Err(WorkflowError::validation(
                "referenced application is not a building permit",
            ));
        }
        if !parent.has_issued_permit() {
            return Err(WorkflowError::validation(
                "building permit has not been issued yet",
            ));
        }
        self.submit(actor, ApplicationType::Occupancy, Some(parent.id), payload)
            .await
    }

    async fn submit(
        &self,
        actor: &Actor,
        application_type: ApplicationType,
        building_permit_id: Option<Uuid>,
        payload: JsonValue,
    ) -> Result<ApplicationRecord, WorkflowError> {
        if !payload.is_object() {
            return Err(WorkflowError::validation(
                "application payload must be a JSON object",
            ));
        }

        let now = OffsetDateTime::now_utc();
        let application = self
            .applications
            .create(NewApplicationParams {
                id: Uuid::new_v4(),
                application_type,
                applicant: actor.id.clone(),
                payload,
                building_permit_id,
                admin_checklist: AdminChecklist::seeded(),
                initial_entry: WorkflowEntry {
                    status: ApplicationStatus::Submitted,
                    comments: "Application submitted".into(),
                    updated_by: actor.id.clone(),
                    timestamp: now,
                },
                created_at: now,
            })
            .await?;

        metrics::counter!("permiso_applications_submitted_total").increment(1);
        tracing::info!(
            application_id = %application.id,
            reference_no = %application.reference_no,
            application_type = application_type.as_str(),
            "application submitted"
        );

        self.attach_rendered_form(&application).await;
        Ok(application)
    }

    /// Generate and attach the filled application form when a renderer is
    /// wired. Failures are logged, not surfaced.
    async fn attach_rendered_form(&self, application: &ApplicationRecord) {
        let Some(renderer) = &self.form_renderer else {
            return;
        };
        let rendered = match renderer.render_application_form(application).await {
            Ok(rendered) => rendered,
            Err(error) => {
                tracing::warn!(
                    application_id = %application.id,
                    %error,
                    "application form rendering failed"
                );
                return;
            }
        };
        let appended = self
            .documents
            .append(NewDocumentParams {
                application_id: application.id,
                application_type: application.application_type,
                requirement_name: "Completed Application Form".into(),
                file_name: rendered.file_name,
                content_type: rendered.content_type,
                content: rendered.content,
                uploaded_by: Uploader::System,
                uploaded_by_role: None,
                notes: None,
                uploaded_at: OffsetDateTime::now_utc(),
            })
            .await;
        if let Err(error) = appended {
            tracing::warn!(
                application_id = %application.id,
                %error,
                "generated form could not be stored"
            );
        }
    }

    /// Validate and apply a requested status transition.
    pub async fn apply_transition(
        &self,
        id: Uuid,
        requested_status: &str,
        actor: &Actor,
        command: TransitionCommand,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        let target = ApplicationStatus::normalize(requested_status).ok_or_else(|| {
            rejected(WorkflowError::InvalidStatus {
                requested: requested_status.to_string(),
            })
        })?;

        let rule = workflow::rule_for(application.status, target);

        if let Some(office) = rule.driven_by
            && actor.role.office() != Some(office)
        {
            return Err(rejected(WorkflowError::forbidden(actor.role)));
        }

        if workflow::is_forward_progress(target)
            && application.rejection_details.has_unresolved_flags()
        {
            return Err(rejected(WorkflowError::UnresolvedFlags {
                missing: application.rejection_details.missing_documents.clone(),
            }));
        }

        if let Some(office) = rule.required_documents {
            let count = self
                .documents
                .count_office_documents(application.id, office)
                .await?;
            if count == 0 {
                return Err(rejected(WorkflowError::MissingRequiredDocuments {
                    office,
                }));
            }
        }

        let rejection_details = match rule.rejection_effect {
            RejectionEffect::Record => Some(RejectionDetails::rejected(
                command.comments.clone().unwrap_or_default(),
                command.missing_documents,
            )),
            RejectionEffect::Clear => Some(RejectionDetails::resolved_empty()),
            RejectionEffect::None => None,
        };

        let now = OffsetDateTime::now_utc();
        // Issuance is idempotent: once a permit number exists it is never
        // regenerated or overwritten.
        let permit = if target == ApplicationStatus::PermitIssued
            && !application.has_issued_permit()
        {
            let permit_number = self.permit_numbers.generate(now).await?;
            metrics::counter!("permiso_permits_issued_total").increment(1);
            Some(PermitRecord {
                permit_number,
                issued_at: now,
                issued_by: actor.id.clone(),
            })
        } else {
            None
        };

        let updated = self
            .applications
            .apply_transition(TransitionUpdate {
                id: application.id,
                status: target,
                rejection_details,
                permit,
                history_entry: WorkflowEntry {
                    status: target,
                    comments: command.comments.unwrap_or_default(),
                    updated_by: actor.id.clone(),
                    timestamp: now,
                },
                updated_at: now,
            })
            .await?;

        metrics::counter!("permiso_transitions_accepted_total").increment(1);
        tracing::info!(
            application_id = %updated.id,
            from = application.status.as_str(),
            to = target.as_str(),
            actor = %actor.id,
            "status transition applied"
        );
        Ok(updated)
    }

    /// Record a payment proof and move the application to
    /// `Payment Submitted` in the same request.
    pub async fn submit_payment_proof(
        &self,
        id: Uuid,
        actor: &Actor,
        submission: PaymentSubmission,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        if !actor.may_access(&application) {
            return Err(WorkflowError::forbidden(actor.role));
        }
        if !matches!(
            application.status,
            ApplicationStatus::PaymentPending | ApplicationStatus::PaymentSubmitted
        ) {
            return Err(WorkflowError::validation(format!(
                "payment is not expected while the application is `{}`",
                application.status.as_str()
            )));
        }
        if submission.amount_centavos <= 0 {
            return Err(WorkflowError::validation("payment amount must be positive"));
        }
        if submission.method == PaymentMethod::Online && submission.reference_code.is_none() {
            return Err(WorkflowError::validation(
                "online payments require a reference code",
            ));
        }

        let now = OffsetDateTime::now_utc();
        self.payments
            .upsert(PaymentUpsertParams {
                application_id: application.id,
                application_type: application.application_type,
                amount_centavos: submission.amount_centavos,
                method: submission.method,
                reference_code: submission.reference_code,
                proof: submission.proof,
                submitted_at: now,
            })
            .await?;

        let updated = self
            .applications
            .apply_transition(TransitionUpdate {
                id: application.id,
                status: ApplicationStatus::PaymentSubmitted,
                rejection_details: None,
                permit: None,
                history_entry: WorkflowEntry {
                    status: ApplicationStatus::PaymentSubmitted,
                    comments: "Payment proof submitted".into(),
                    updated_by: actor.id.clone(),
                    timestamp: now,
                },
                updated_at: now,
            })
            .await?;

        metrics::counter!("permiso_transitions_accepted_total").increment(1);
        Ok(updated)
    }

    /// Applicant response to a rejection: revision files are appended to
    /// the ledger and the application re-enters the review pipeline at
    /// the desk named in the rejection comments (BFP when mentioned,
    /// otherwise MEO). The rejection sub-record is marked resolved.
    pub async fn resubmit_revisions(
        &self,
        id: Uuid,
        actor: &Actor,
        files: Vec<RevisionUpload>,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        if !actor.may_access(&application) {
            return Err(WorkflowError::forbidden(actor.role));
        }
        if application.status != ApplicationStatus::Rejected {
            return Err(WorkflowError::validation(
                "revisions can only be resubmitted for a rejected application",
            ));
        }
        if files.is_empty() {
            return Err(WorkflowError::validation(
                "a resubmission must include at least one file",
            ));
        }

        let now = OffsetDateTime::now_utc();
        for file in files {
            if file.requirement_name.trim().is_empty() {
                return Err(WorkflowError::validation(
                    "document requirement name is required",
                ));
            }
            self.documents
                .append(NewDocumentParams {
                    application_id: application.id,
                    application_type: application.application_type,
                    requirement_name: file.requirement_name,
                    file_name: file.file_name,
                    content_type: file.content_type,
                    content: file.content,
                    uploaded_by: Uploader::User,
                    uploaded_by_role: None,
                    notes: None,
                    uploaded_at: now,
                })
                .await?;
        }

        let target = if application
            .rejection_details
            .comments
            .to_uppercase()
            .contains("BFP")
        {
            ApplicationStatus::PendingBfp
        } else {
            ApplicationStatus::PendingMeo
        };

        let mut resolved = application.rejection_details.clone();
        resolved.is_resolved = true;
        resolved.missing_documents.clear();

        let updated = self
            .applications
            .apply_transition(TransitionUpdate {
                id: application.id,
                status: target,
                rejection_details: Some(resolved),
                permit: None,
                history_entry: WorkflowEntry {
                    status: target,
                    comments: "Revision documents submitted".into(),
                    updated_by: actor.id.clone(),
                    timestamp: now,
                },
                updated_at: now,
            })
            .await?;

        metrics::counter!("permiso_transitions_accepted_total").increment(1);
        Ok(updated)
    }

    pub async fn get_application(
        &self,
        id: Uuid,
        requester: &Actor,
    ) -> Result<ApplicationView, WorkflowError> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        self.enrich(application, requester).await
    }

    pub async fn get_by_reference(
        &self,
        reference_no: &str,
        requester: &Actor,
    ) -> Result<ApplicationView, WorkflowError> {
        let application = self
            .applications
            .find_by_reference(reference_no)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        self.enrich(application, requester).await
    }

    pub async fn list_for_applicant(
        &self,
        requester: &Actor,
    ) -> Result<Vec<ApplicationView>, WorkflowError> {
        let applications = self.applications.list_for_applicant(&requester.id).await?;
        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            views.push(self.enrich(application, requester).await?);
        }
        Ok(views)
    }

    pub async fn list_all(&self, requester: &Actor) -> Result<Vec<ApplicationView>, WorkflowError> {
        if !requester.role.is_admin() {
            return Err(WorkflowError::forbidden(requester.role));
        }
        let applications = self.applications.list_all().await?;
        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            views.push(self.enrich(application, requester).await?);
        }
        Ok(views)
    }

    async fn enrich(
        &self,
        application: ApplicationRecord,
        requester: &Actor,
    ) -> Result<ApplicationView, WorkflowError> {
        if !requester.may_access(&application) {
            return Err(WorkflowError::forbidden(requester.role));
        }
        let listed = self.documents.list_active(application.id).await?;
        let visible =
            documents::filter_for_requester(listed, requester.role, application.status);
        let payment = self.payments.find_by_application(application.id).await?;
        Ok(ApplicationView {
            application,
            documents: visible,
            payment,
        })
    }

    async fn resolve_application(
        &self,
        identifier: &str,
    ) -> Result<Option<ApplicationRecord>, WorkflowError> {
        if let Ok(id) = Uuid::parse_str(identifier) {
            return Ok(self.applications.find_by_id(id).await?);
        }
        Ok(self.applications.find_by_reference(identifier).await?)
    }
}

fn rejected(error: WorkflowError) -> WorkflowError {
    metrics::counter!("permiso_transitions_rejected_total").increment(1);
    error
}
