//! Checklist tracker: batch flag/resolve with optimistic persistence.
//!
//! Both operations rewrite the whole checklist structure plus the
//! rejection sub-record, so they go through the revision
//! compare-and-swap path wrapped in the bounded retry. Each attempt
//! reloads fresh state before reapplying the batch.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::WorkflowError;
use crate::application::repos::{ApplicationsRepo, ChecklistSave};
use crate::application::retry::with_write_conflict_retry;
use crate::application::workflow::Actor;
use crate::domain::applications::{ApplicationRecord, WorkflowEntry};
use crate::domain::checklist::{self, ItemKey};
use crate::domain::types::ApplicationStatus;

#[derive(Clone)]
pub struct ChecklistService {
    applications: Arc<dyn ApplicationsRepo>,
}

impl ChecklistService {
    pub fn new(applications: Arc<dyn ApplicationsRepo>) -> Self {
        Self { applications }
    }

    /// Flag checklist items as deficient. Newly flagged labels are added
    /// to the missing-documents list and, when any item actually flips,
    /// the application is forced to `Rejected`.
    pub async fn flag_items(
        &self,
        id: Uuid,
        keys: Vec<ItemKey>,
        note: Option<String>,
        actor: &Actor,
    ) -> Result<ApplicationRecord, WorkflowError> {
        require_admin(actor)?;
        validate_keys(&keys)?;

        with_write_conflict_retry(|| {
            let keys = keys.clone();
            let note = note.clone();
            async move {
                let mut application = self.load(id).await?;
                application.admin_checklist.ensure_seeded();

                let newly_flagged = application.admin_checklist.flag(&keys);
                if newly_flagged.is_empty() {
                    return Ok(application);
                }

                let mut details = application.rejection_details.clone();
                details.missing_documents =
                    checklist::add_missing(details.missing_documents, &newly_flagged);
                details.is_resolved = false;
                if let Some(note) = note {
                    details.comments = note;
                }

                let now = OffsetDateTime::now_utc();
                let history_entry = (application.status != ApplicationStatus::Rejected).then(|| {
                    WorkflowEntry {
                        status: ApplicationStatus::Rejected,
                        comments: format!(
                            "Checklist items flagged: {}",
                            newly_flagged.join(", ")
                        ),
                        updated_by: actor.id.clone(),
                        timestamp: now,
                    }
                });

                let saved = self
                    .applications
                    .save_checklist(ChecklistSave {
                        id: application.id,
                        expected_revision: application.revision,
                        admin_checklist: application.admin_checklist,
                        rejection_details: details,
                        status: ApplicationStatus::Rejected,
                        history_entry,
                        updated_at: now,
                    })
                    .await?;
                Ok(saved)
            }
        })
        .await
    }

    /// Clear flags on checklist items. Resolved labels leave the
    /// missing-documents list; `is_resolved` is re-derived from what
    /// remains. The status is not moved here.
    pub async fn resolve_items(
        &self,
        id: Uuid,
        keys: Vec<ItemKey>,
        actor: &Actor,
    ) -> Result<ApplicationRecord, WorkflowError> {
        require_admin(actor)?;
        validate_keys(&keys)?;

        with_write_conflict_retry(|| {
            let keys = keys.clone();
            async move {
                let mut application = self.load(id).await?;
                application.admin_checklist.ensure_seeded();

                let now = OffsetDateTime::now_utc();
                let resolved = application.admin_checklist.resolve(&keys, &actor.id, now);
                if resolved.is_empty() {
                    return Ok(application);
                }

                let mut details = application.rejection_details.clone();
                details.missing_documents =
                    checklist::remove_missing(details.missing_documents, &resolved);
                details.is_resolved = details.missing_documents.is_empty()
                    && application.admin_checklist.flagged_labels().is_empty();

                let saved = self
                    .applications
                    .save_checklist(ChecklistSave {
                        id: application.id,
                        expected_revision: application.revision,
                        admin_checklist: application.admin_checklist,
                        rejection_details: details,
                        status: application.status,
                        history_entry: None,
                        updated_at: now,
                    })
                    .await?;
                Ok(saved)
            }
        })
        .await
    }

    async fn load(&self, id: Uuid) -> Result<ApplicationRecord, WorkflowError> {
        self.applications
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)
    }
}

fn require_admin(actor: &Actor) -> Result<(), WorkflowError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(WorkflowError::forbidden(actor.role))
    }
}

fn validate_keys(keys: &[ItemKey]) -> Result<(), WorkflowError> {
    if keys.is_empty() {
        return Err(WorkflowError::validation(
            "at least one checklist item must be selected",
        ));
    }
    for key in keys {
        let known = checklist::category(&key.category)
            .is_some_and(|cat| cat.items.contains(&key.item.as_str()));
        if !known {
            return Err(WorkflowError::validation(format!(
                "unknown checklist item `{}` in category `{}`",
                key.item, key.category
            )));
        }
    }
    Ok(())
}
