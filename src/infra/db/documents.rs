use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{DocumentsRepo, NewDocumentParams, RepoError};
use crate::domain::documents::DocumentRecord;
use crate::domain::types::{ApplicationType, ReviewOffice, Uploader};

use super::{PostgresRepositories, map_sqlx_error};

const DOCUMENT_COLUMNS: &str = "id, application_id, application_type, requirement_name, \
     file_name, content_type, content, uploaded_by, uploaded_by_role, original_index, \
     is_active, notes, uploaded_at";

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    application_id: Uuid,
    application_type: String,
    requirement_name: String,
    file_name: String,
    content_type: String,
    content: Vec<u8>,
    uploaded_by: String,
    uploaded_by_role: Option<String>,
    original_index: i32,
    is_active: bool,
    notes: Option<String>,
    uploaded_at: OffsetDateTime,
}

impl TryFrom<DocumentRow> for DocumentRecord {
    type Error = RepoError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let application_type = ApplicationType::try_from(row.application_type.as_str())
            .map_err(|_| {
                RepoError::from_persistence(format!(
                    "stored application type `{}` is unknown",
                    row.application_type
                ))
            })?;
        let uploaded_by = Uploader::try_from(row.uploaded_by.as_str()).map_err(|_| {
            RepoError::from_persistence(format!(
                "stored uploader `{}` is unknown",
                row.uploaded_by
            ))
        })?;
        let uploaded_by_role = row
            .uploaded_by_role
            .as_deref()
            .map(|role| {
                ReviewOffice::try_from(role).map_err(|_| {
                    RepoError::from_persistence(format!("stored office `{role}` is unknown"))
                })
            })
            .transpose()?;

        Ok(Self {
            id: row.id,
            application_id: row.application_id,
            application_type,
            requirement_name: row.requirement_name,
            file_name: row.file_name,
            content_type: row.content_type,
            content: row.content,
            uploaded_by,
            uploaded_by_role,
            original_index: row.original_index,
            is_active: row.is_active,
            notes: row.notes,
            uploaded_at: row.uploaded_at,
        })
    }
}

#[async_trait]
impl DocumentsRepo for PostgresRepositories {
    async fn append(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO documents \
             (id, application_id, application_type, requirement_name, file_name, content_type, \
              content, uploaded_by, uploaded_by_role, original_index, is_active, notes, uploaded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
                     (SELECT COALESCE(MAX(original_index) + 1, 0) \
                        FROM documents WHERE application_id = $2), \
                     TRUE, $10, $11) \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.application_id)
            .bind(params.application_type.as_str())
            .bind(&params.requirement_name)
            .bind(&params.file_name)
            .bind(&params.content_type)
            .bind(&params.content)
            .bind(params.uploaded_by.as_str())
            .bind(params.uploaded_by_role.map(ReviewOffice::as_str))
            .bind(params.notes.as_deref())
            .bind(params.uploaded_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn replace(&self, params: NewDocumentParams) -> Result<DocumentRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Supersede the active row for the same requirement, keeping its
        // ledger position. Absent a match the upload lands at the next
        // free index like a plain append.
        let superseded: Option<i32> = sqlx::query_scalar(
            "UPDATE documents SET is_active = FALSE \
             WHERE id = (SELECT id FROM documents \
                          WHERE application_id = $1 AND requirement_name = $2 AND is_active \
                          ORDER BY original_index ASC LIMIT 1) \
             RETURNING original_index",
        )
        .bind(params.application_id)
        .bind(&params.requirement_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let original_index = match superseded {
            Some(index) => index,
            None => sqlx::query_scalar(
                "SELECT COALESCE(MAX(original_index) + 1, 0) \
                 FROM documents WHERE application_id = $1",
            )
            .bind(params.application_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?,
        };

        let sql = format!(
            "INSERT INTO documents \
             (id, application_id, application_type, requirement_name, file_name, content_type, \
              content, uploaded_by, uploaded_by_role, original_index, is_active, notes, uploaded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11, $12) \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.application_id)
            .bind(params.application_type.as_str())
            .bind(&params.requirement_name)
            .bind(&params.file_name)
            .bind(&params.content_type)
            .bind(&params.content)
            .bind(params.uploaded_by.as_str())
            .bind(params.uploaded_by_role.map(ReviewOffice::as_str))
            .bind(original_index)
            .bind(params.notes.as_deref())
            .bind(params.uploaded_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn find_active_by_index(
        &self,
        application_id: Uuid,
        original_index: i32,
    ) -> Result<Option<DocumentRecord>, RepoError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE application_id = $1 AND original_index = $2 AND is_active"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(application_id)
            .bind(original_index)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_active(&self, application_id: Uuid) -> Result<Vec<DocumentRecord>, RepoError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE application_id = $1 AND is_active \
             ORDER BY original_index ASC"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(application_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_office_documents(
        &self,
        application_id: Uuid,
        office: ReviewOffice,
    ) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents \
             WHERE application_id = $1 AND is_active \
               AND uploaded_by = 'admin' AND uploaded_by_role = $2",
        )
        .bind(application_id)
        .bind(office.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        count
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}
