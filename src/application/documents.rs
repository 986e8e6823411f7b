//! Document ledger service.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::WorkflowError;
use crate::application::repos::{ApplicationsRepo, DocumentsRepo, NewDocumentParams};
use crate::application::workflow::Actor;
use crate::domain::documents::{self, DocumentRecord};
use crate::domain::types::Uploader;

/// One incoming file destined for an application's ledger.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub requirement_name: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct DocumentService {
    applications: Arc<dyn ApplicationsRepo>,
    documents: Arc<dyn DocumentsRepo>,
}

impl DocumentService {
    pub fn new(applications: Arc<dyn ApplicationsRepo>, documents: Arc<dyn DocumentsRepo>) -> Self {
        Self {
            applications,
            documents,
        }
    }

    /// Append a new ledger row at the next free index.
    pub async fn append(
        &self,
        application_id: Uuid,
        actor: &Actor,
        upload: DocumentUpload,
    ) -> Result<DocumentRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !actor.may_access(&application) {
            return Err(WorkflowError::forbidden(actor.role));
        }
        let params = self.to_params(&application.id, application.application_type, actor, upload)?;
        Ok(self.documents.append(params).await?)
    }

    /// Replace the active row satisfying the upload's requirement,
    /// keeping its ledger position. When no active row matches the
    /// requirement name the upload is appended as a new document.
    pub async fn replace(
        &self,
        application_id: Uuid,
        actor: &Actor,
        upload: DocumentUpload,
    ) -> Result<DocumentRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !actor.may_access(&application) {
            return Err(WorkflowError::forbidden(actor.role));
        }
        let params = self.to_params(&application.id, application.application_type, actor, upload)?;
        Ok(self.documents.replace(params).await?)
    }

    /// Positional read. Documents the requester may not see are reported
    /// as absent, not as forbidden.
    pub async fn get_by_index(
        &self,
        application_id: Uuid,
        original_index: i32,
        requester: &Actor,
    ) -> Result<DocumentRecord, WorkflowError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !requester.may_access(&application) {
            return Err(WorkflowError::forbidden(requester.role));
        }
        let document = self
            .documents
            .find_active_by_index(application.id, original_index)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !documents::visible_to(&document, requester.role, application.status) {
            return Err(WorkflowError::NotFound);
        }
        Ok(document)
    }

    pub async fn list(
        &self,
        application_id: Uuid,
        requester: &Actor,
    ) -> Result<Vec<DocumentRecord>, WorkflowError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !requester.may_access(&application) {
            return Err(WorkflowError::forbidden(requester.role));
        }
        let listed = self.documents.list_active(application.id).await?;
        Ok(documents::filter_for_requester(
            listed,
            requester.role,
            application.status,
        ))
    }

    fn to_params(
        &self,
        application_id: &Uuid,
        application_type: crate::domain::types::ApplicationType,
        actor: &Actor,
        upload: DocumentUpload,
    ) -> Result<NewDocumentParams, WorkflowError> {
        if upload.requirement_name.trim().is_empty() {
            return Err(WorkflowError::validation(
                "document requirement name is required",
            ));
        }
        let (uploaded_by, uploaded_by_role) = if actor.role.is_admin() {
            (Uploader::Admin, actor.role.office())
        } else {
            (Uploader::User, None)
        };
        Ok(NewDocumentParams {
            application_id: *application_id,
            application_type,
            requirement_name: upload.requirement_name,
            file_name: upload.file_name,
            content_type: upload.content_type,
            content: upload.content,
            uploaded_by,
            uploaded_by_role,
            notes: upload.notes,
            uploaded_at: OffsetDateTime::now_utc(),
        })
    }
}
