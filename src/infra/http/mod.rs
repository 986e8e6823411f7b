pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::AppState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/applications", get(handlers::list_applications))
        .route("/api/v1/applications/building", post(handlers::submit_building))
        .route("/api/v1/applications/occupancy", post(handlers::submit_occupancy))
        .route("/api/v1/applications/{id}", get(handlers::get_application))
        .route(
            "/api/v1/applications/reference/{reference}",
            get(handlers::get_by_reference),
        )
        .route(
            "/api/v1/applications/{id}/status",
            post(handlers::apply_transition),
        )
        .route(
            "/api/v1/applications/{id}/revisions",
            post(handlers::resubmit_revisions),
        )
        .route(
            "/api/v1/applications/{id}/documents",
            get(handlers::list_documents)
                .post(handlers::upload_document)
                .put(handlers::replace_document),
        )
        .route(
            "/api/v1/applications/{id}/documents/{index}",
            get(handlers::get_document),
        )
        .route(
            "/api/v1/applications/{id}/payment",
            get(handlers::get_payment).post(handlers::submit_payment),
        )
        .route(
            "/api/v1/applications/{id}/payment/proof",
            get(handlers::get_payment_proof),
        )
        .route(
            "/api/v1/applications/{id}/payment/status",
            post(handlers::set_payment_status),
        )
        .route(
            "/api/v1/applications/{id}/checklist/flag",
            post(handlers::flag_checklist_items),
        )
        .route(
            "/api/v1/applications/{id}/checklist/resolve",
            post(handlers::resolve_checklist_items),
        )
        .layer(axum_middleware::from_fn(middleware::require_actor));

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .merge(api)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}
