use std::sync::Arc;

use crate::application::checklist::ChecklistService;
use crate::application::documents::DocumentService;
use crate::application::payments::PaymentsService;
use crate::application::repos::{ApplicationsRepo, DocumentsRepo, PaymentsRepo};
use crate::application::workflow::{FormRenderer, WorkflowService};
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowService>,
    pub documents: Arc<DocumentService>,
    pub payments: Arc<PaymentsService>,
    pub checklist: Arc<ChecklistService>,
    /// Present when backed by Postgres; absent under test fakes.
    pub db: Option<Arc<PostgresRepositories>>,
}

impl AppState {
    /// Wire the services over any repository implementations.
    pub fn from_repos(
        applications: Arc<dyn ApplicationsRepo>,
        documents: Arc<dyn DocumentsRepo>,
        payments: Arc<dyn PaymentsRepo>,
        form_renderer: Option<Arc<dyn FormRenderer>>,
    ) -> Self {
        Self {
            workflow: Arc::new(WorkflowService::new(
                Arc::clone(&applications),
                Arc::clone(&documents),
                Arc::clone(&payments),
                form_renderer,
            )),
            documents: Arc::new(DocumentService::new(
                Arc::clone(&applications),
                Arc::clone(&documents),
            )),
            payments: Arc::new(PaymentsService::new(
                Arc::clone(&applications),
                Arc::clone(&payments),
            )),
            checklist: Arc::new(ChecklistService::new(applications)),
            db: None,
        }
    }

    pub fn with_postgres(db: PostgresRepositories) -> Self {
        let db = Arc::new(db);
        let applications: Arc<dyn ApplicationsRepo> = db.clone();
        let documents: Arc<dyn DocumentsRepo> = db.clone();
        let payments: Arc<dyn PaymentsRepo> = db.clone();
        let mut state = Self::from_repos(applications, documents, payments, None);
        state.db = Some(db);
        state
    }
}
