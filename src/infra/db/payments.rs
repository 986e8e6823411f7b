use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{PaymentUpsertParams, PaymentsRepo, RepoError};
use crate::domain::payments::{PaymentProof, PaymentRecord};
use crate::domain::types::{ApplicationType, PaymentMethod, PaymentStatus};

use super::{PostgresRepositories, map_sqlx_error};

const PAYMENT_COLUMNS: &str = "id, application_id, application_type, amount_centavos, method, \
     reference_code, proof_file_name, proof_content_type, proof_content, status, \
     submitted_at, updated_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    application_id: Uuid,
    application_type: String,
    amount_centavos: i64,
    method: String,
    reference_code: Option<String>,
    proof_file_name: Option<String>,
    proof_content_type: Option<String>,
    proof_content: Option<Vec<u8>>,
    status: String,
    submitted_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = RepoError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let application_type = ApplicationType::try_from(row.application_type.as_str())
            .map_err(|_| {
                RepoError::from_persistence(format!(
                    "stored application type `{}` is unknown",
                    row.application_type
                ))
            })?;
        let method = PaymentMethod::try_from(row.method.as_str()).map_err(|_| {
            RepoError::from_persistence(format!("stored payment method `{}` is unknown", row.method))
        })?;
        let status = PaymentStatus::try_from(row.status.as_str()).map_err(|_| {
            RepoError::from_persistence(format!("stored payment status `{}` is unknown", row.status))
        })?;
        let proof = match (row.proof_file_name, row.proof_content_type) {
            (Some(file_name), Some(content_type)) => Some(PaymentProof {
                file_name,
                content_type,
                content: row.proof_content.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            application_id: row.application_id,
            application_type,
            amount_centavos: row.amount_centavos,
            method,
            reference_code: row.reference_code,
            proof,
            status,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentsRepo for PostgresRepositories {
    async fn upsert(&self, params: PaymentUpsertParams) -> Result<PaymentRecord, RepoError> {
        let (proof_file_name, proof_content_type, proof_content) = match &params.proof {
            Some(proof) => (
                Some(proof.file_name.as_str()),
                Some(proof.content_type.as_str()),
                Some(proof.content.as_slice()),
            ),
            None => (None, None, None),
        };

        let sql = format!(
            "INSERT INTO payments \
             (id, application_id, application_type, amount_centavos, method, reference_code, \
              proof_file_name, proof_content_type, proof_content, status, submitted_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             ON CONFLICT (application_id) DO UPDATE SET \
               amount_centavos = EXCLUDED.amount_centavos, \
               method = EXCLUDED.method, \
               reference_code = EXCLUDED.reference_code, \
               proof_file_name = EXCLUDED.proof_file_name, \
               proof_content_type = EXCLUDED.proof_content_type, \
               proof_content = EXCLUDED.proof_content, \
               status = EXCLUDED.status, \
               submitted_at = EXCLUDED.submitted_at, \
               updated_at = EXCLUDED.updated_at \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.application_id)
            .bind(params.application_type.as_str())
            .bind(params.amount_centavos)
            .bind(params.method.as_str())
            .bind(params.reference_code.as_deref())
            .bind(proof_file_name)
            .bind(proof_content_type)
            .bind(proof_content)
            .bind(PaymentStatus::Pending.as_str())
            .bind(params.submitted_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<PaymentRecord>, RepoError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE application_id = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(application_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn set_status(
        &self,
        application_id: Uuid,
        status: PaymentStatus,
        updated_at: OffsetDateTime,
    ) -> Result<PaymentRecord, RepoError> {
        let sql = format!(
            "UPDATE payments SET status = $2, updated_at = $3 \
             WHERE application_id = $1 \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(application_id)
            .bind(status.as_str())
            .bind(updated_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        row.try_into()
    }
}
