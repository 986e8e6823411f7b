use async_trait::async_trait;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ApplicationsRepo, ChecklistSave, NewApplicationParams, RepoError, TransitionUpdate,
};
use crate::domain::applications::ApplicationRecord;
use crate::domain::permit_numbers;
use crate::domain::types::{ApplicationStatus, ApplicationType};

use super::{PostgresRepositories, map_sqlx_error};

const APPLICATION_COLUMNS: &str = "id, application_type, reference_no, applicant, status, \
     workflow_history, rejection_details, admin_checklist, permit, building_permit_id, \
     payload, created_at, updated_at, revision";

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    application_type: String,
    reference_no: String,
    applicant: String,
    status: String,
    workflow_history: JsonValue,
    rejection_details: JsonValue,
    admin_checklist: JsonValue,
    permit: Option<JsonValue>,
    building_permit_id: Option<Uuid>,
    payload: JsonValue,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    revision: i64,
}

impl TryFrom<ApplicationRow> for ApplicationRecord {
    type Error = RepoError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let application_type = ApplicationType::try_from(row.application_type.as_str())
            .map_err(|_| {
                RepoError::from_persistence(format!(
                    "stored application type `{}` is unknown",
                    row.application_type
                ))
            })?;
        let status = ApplicationStatus::normalize(&row.status).ok_or_else(|| {
            RepoError::from_persistence(format!("stored status `{}` is unknown", row.status))
        })?;
        let permit = row
            .permit
            .map(serde_json::from_value)
            .transpose()
            .map_err(RepoError::from_persistence)?;

        Ok(Self {
            id: row.id,
            application_type,
            reference_no: row.reference_no,
            applicant: row.applicant,
            status,
            workflow_history: serde_json::from_value(row.workflow_history)
                .map_err(RepoError::from_persistence)?,
            rejection_details: serde_json::from_value(row.rejection_details)
                .map_err(RepoError::from_persistence)?,
            admin_checklist: serde_json::from_value(row.admin_checklist)
                .map_err(RepoError::from_persistence)?,
            permit,
            building_permit_id: row.building_permit_id,
            payload: row.payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
            revision: row.revision,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<JsonValue, RepoError> {
    serde_json::to_value(value).map_err(RepoError::from_persistence)
}

#[async_trait]
impl ApplicationsRepo for PostgresRepositories {
    async fn create(&self, params: NewApplicationParams) -> Result<ApplicationRecord, RepoError> {
        // "BP-25-" / "OP-25-"; the 6-digit tail comes from the shared
        // sequence so both types draw from one number space.
        let reference_prefix = format!(
            "{}-{:02}-",
            params.application_type.reference_prefix(),
            params.created_at.year() % 100
        );
        let history = to_json(&vec![params.initial_entry])?;
        let checklist = to_json(&params.admin_checklist)?;
        let rejection = to_json(&crate::domain::applications::RejectionDetails::resolved_empty())?;

        let sql = format!(
            "INSERT INTO applications \
             (id, application_type, reference_no, applicant, status, workflow_history, \
              rejection_details, admin_checklist, permit, building_permit_id, payload, \
              created_at, updated_at, revision) \
             VALUES ($1, $2, $3 || lpad(nextval('application_reference_seq')::text, 6, '0'), \
                     $4, $5, $6, $7, $8, NULL, $9, $10, $11, $11, 1) \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(params.id)
            .bind(params.application_type.as_str())
            .bind(reference_prefix)
            .bind(&params.applicant)
            .bind(ApplicationStatus::Submitted.as_str())
            .bind(history)
            .bind(rejection)
            .bind(checklist)
            .bind(params.building_permit_id)
            .bind(&params.payload)
            .bind(params.created_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicationRecord>, RepoError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_reference(
        &self,
        reference_no: &str,
    ) -> Result<Option<ApplicationRecord>, RepoError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE LOWER(reference_no) = LOWER($1)"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(reference_no)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_applicant(
        &self,
        applicant: &str,
    ) -> Result<Vec<ApplicationRecord>, RepoError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE applicant = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(applicant)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>, RepoError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn apply_transition(
        &self,
        update: TransitionUpdate,
    ) -> Result<ApplicationRecord, RepoError> {
        // One statement: the status change and its history entry are
        // never observable apart.
        let entry = to_json(&vec![update.history_entry])?;
        let rejection = update.rejection_details.as_ref().map(to_json).transpose()?;
        let permit = update.permit.as_ref().map(to_json).transpose()?;

        let sql = format!(
            "UPDATE applications SET \
               status = $2, \
               workflow_history = workflow_history || $3::jsonb, \
               rejection_details = COALESCE($4::jsonb, rejection_details), \
               permit = COALESCE($5::jsonb, permit), \
               updated_at = $6, \
               revision = revision + 1 \
             WHERE id = $1 \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(update.id)
            .bind(update.status.as_str())
            .bind(entry)
            .bind(rejection)
            .bind(permit)
            .bind(update.updated_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        row.try_into()
    }

    async fn save_checklist(&self, save: ChecklistSave) -> Result<ApplicationRecord, RepoError> {
        let checklist = to_json(&save.admin_checklist)?;
        let rejection = to_json(&save.rejection_details)?;
        let entry = save
            .history_entry
            .as_ref()
            .map(|entry| to_json(&vec![entry]))
            .transpose()?;

        let sql = format!(
            "UPDATE applications SET \
               admin_checklist = $2::jsonb, \
               rejection_details = $3::jsonb, \
               status = $4, \
               workflow_history = workflow_history || COALESCE($5::jsonb, '[]'::jsonb), \
               updated_at = $6, \
               revision = revision + 1 \
             WHERE id = $1 AND revision = $7 \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(save.id)
            .bind(checklist)
            .bind(rejection)
            .bind(save.status.as_str())
            .bind(entry)
            .bind(save.updated_at)
            .bind(save.expected_revision)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.try_into(),
            // Revision miss and missing row look identical to the UPDATE;
            // disambiguate so the caller retries only true conflicts.
            None => {
                let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM applications WHERE id = $1")
                    .bind(save.id)
                    .fetch_optional(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
                if exists.is_some() {
                    Err(RepoError::Conflict)
                } else {
                    Err(RepoError::NotFound)
                }
            }
        }
    }

    async fn max_permit_sequence(
        &self,
        application_type: ApplicationType,
        period_key: &str,
    ) -> Result<Option<u32>, RepoError> {
        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT permit->>'permit_number' FROM applications \
             WHERE application_type = $1 \
               AND permit IS NOT NULL \
               AND permit->>'permit_number' LIKE $2",
        )
        .bind(application_type.as_str())
        .bind(format!("{period_key}%"))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(numbers
            .iter()
            .filter_map(|number| permit_numbers::sequence_of(number, period_key))
            .max())
    }
}
