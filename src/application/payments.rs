//! Payment ledger service. Submission lives on the workflow engine
//! because it also moves the status; this service covers reads and the
//! MEO verification step.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::WorkflowError;
use crate::application::repos::{ApplicationsRepo, PaymentsRepo};
use crate::application::workflow::Actor;
use crate::domain::payments::{PaymentProof, PaymentRecord};
use crate::domain::types::{PaymentStatus, RequesterRole};

#[derive(Clone)]
pub struct PaymentsService {
    applications: Arc<dyn ApplicationsRepo>,
    payments: Arc<dyn PaymentsRepo>,
}

impl PaymentsService {
    pub fn new(applications: Arc<dyn ApplicationsRepo>, payments: Arc<dyn PaymentsRepo>) -> Self {
        Self {
            applications,
            payments,
        }
    }

    pub async fn get(
        &self,
        application_id: Uuid,
        requester: &Actor,
    ) -> Result<PaymentRecord, WorkflowError> {
        self.ensure_access(application_id, requester).await?;
        self.payments
            .find_by_application(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    pub async fn get_proof(
        &self,
        application_id: Uuid,
        requester: &Actor,
    ) -> Result<PaymentProof, WorkflowError> {
        let payment = self.get(application_id, requester).await?;
        payment.proof.ok_or(WorkflowError::NotFound)
    }

    /// Mark a payment Verified or Failed. Only the MEO desk verifies.
    pub async fn set_status(
        &self,
        application_id: Uuid,
        actor: &Actor,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, WorkflowError> {
        if actor.role != RequesterRole::MeoAdmin {
            return Err(WorkflowError::forbidden(actor.role));
        }
        let updated = self
            .payments
            .set_status(application_id, status, OffsetDateTime::now_utc())
            .await?;
        tracing::info!(
            %application_id,
            status = status.as_str(),
            actor = %actor.id,
            "payment status updated"
        );
        Ok(updated)
    }

    async fn ensure_access(
        &self,
        application_id: Uuid,
        requester: &Actor,
    ) -> Result<(), WorkflowError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !requester.may_access(&application) {
            return Err(WorkflowError::forbidden(requester.role));
        }
        Ok(())
    }
}
