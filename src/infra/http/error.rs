use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::application::error::{ErrorReport, WorkflowError};
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_STATUS: &str = "invalid_status";
    pub const UNRESOLVED_FLAGS: &str = "unresolved_flags";
    pub const MISSING_REQUIRED_DOCUMENTS: &str = "missing_required_documents";
    pub const RETRY_EXHAUSTED: &str = "retry_exhausted";
    pub const VALIDATION: &str = "validation_error";
    pub const DUPLICATE: &str = "duplicate";
    pub const CONFLICT: &str = "conflict";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Machine-readable payload for rejections the client acts on, such
    /// as the list of unresolved flag labels behind a 409.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    details: Option<JsonValue>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            details: None,
        }
    }

    fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Actor identity required",
            None,
        )
    }

    pub fn forbidden(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Role may not perform this action",
            hint,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(error: WorkflowError) -> Self {
        let hint = Some(error.to_string());
        match &error {
            WorkflowError::InvalidStatus { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_STATUS,
                "Unknown application status",
                hint,
            ),
            WorkflowError::UnresolvedFlags { missing } => ApiError::new(
                StatusCode::CONFLICT,
                codes::UNRESOLVED_FLAGS,
                "Unresolved rejection flags block this transition",
                hint,
            )
            .with_details(json!({ "unresolved_flags": missing })),
            WorkflowError::MissingRequiredDocuments { .. } => ApiError::new(
                StatusCode::CONFLICT,
                codes::MISSING_REQUIRED_DOCUMENTS,
                "Required office documents are missing",
                hint,
            ),
            WorkflowError::NotFound | WorkflowError::Domain(DomainError::NotFound { .. }) => {
                ApiError::not_found("Resource not found")
            }
            WorkflowError::Forbidden { .. } => ApiError::forbidden(hint),
            WorkflowError::RetryExhausted { .. } => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::RETRY_EXHAUSTED,
                "Concurrent updates kept winning; try again",
                hint,
            ),
            WorkflowError::Validation(_)
            | WorkflowError::Domain(DomainError::Validation { .. }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "Request could not be processed",
                hint,
            ),
            WorkflowError::Domain(DomainError::Invariant { .. }) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Unexpected error occurred",
                hint,
            ),
            WorkflowError::Repo(repo) => match repo {
                RepoError::Duplicate { .. } => ApiError::new(
                    StatusCode::CONFLICT,
                    codes::DUPLICATE,
                    "Duplicate record",
                    hint,
                ),
                RepoError::Conflict => ApiError::new(
                    StatusCode::CONFLICT,
                    codes::CONFLICT,
                    "Concurrent update won",
                    hint,
                ),
                RepoError::Timeout => ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    codes::DB_TIMEOUT,
                    "Service temporarily unavailable",
                    hint,
                ),
                _ => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::REPO,
                    "Storage failure",
                    hint,
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
                details: self.details,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
