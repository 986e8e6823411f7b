use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::Response;
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::types::{RequesterRole, ReviewOffice};

/// Structured error detail attached to responses for the logging
/// middleware; never serialized to clients.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Failures of the workflow engine and its sibling services. Business
/// rejections carry enough structure for stable machine codes at the API
/// boundary.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("unknown application status `{requested}`")]
    InvalidStatus { requested: String },
    #[error("unresolved rejection flags block this transition")]
    UnresolvedFlags { missing: Vec<String> },
    #[error("transition requires at least one {office} document", office = .office.as_str())]
    MissingRequiredDocuments { office: ReviewOffice },
    #[error("resource not found")]
    NotFound,
    #[error("role `{role}` may not perform this action")]
    Forbidden { role: String },
    #[error("write conflict persisted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(role: RequesterRole) -> Self {
        Self::Forbidden {
            role: role.as_str().to_string(),
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => WorkflowError::NotFound,
            RepoError::InvalidInput { message } => WorkflowError::Validation(message),
            other => WorkflowError::Repo(other),
        }
    }
}
