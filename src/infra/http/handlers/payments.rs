//! Payment submission and verification handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use crate::application::workflow::{Actor, PaymentSubmission};
use crate::domain::applications::ApplicationRecord;
use crate::domain::payments::PaymentProof;
use crate::domain::types::{PaymentMethod, PaymentStatus};
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    PaymentProofResponse, PaymentRequest, PaymentResponse, PaymentStatusRequest, decode_base64,
};
use crate::infra::http::state::AppState;

pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    let method = PaymentMethod::try_from(request.method.as_str()).map_err(|_| {
        ApiError::bad_request(
            "unknown payment method",
            Some(format!("`{}` is not a payment method", request.method)),
        )
    })?;
    let proof = request
        .proof
        .map(|file| {
            Ok::<_, ApiError>(PaymentProof {
                file_name: file.file_name,
                content_type: file.content_type,
                content: decode_base64(&file.content)?,
            })
        })
        .transpose()?;

    let updated = state
        .workflow
        .submit_payment_proof(
            id,
            &actor,
            PaymentSubmission {
                amount_centavos: request.amount_centavos,
                method,
                reference_code: request.reference_code,
                proof,
            },
        )
        .await?;
    Ok(Json(updated))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state.payments.get(id, &actor).await?;
    Ok(Json(payment.into()))
}

pub async fn get_payment_proof(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentProofResponse>, ApiError> {
    let proof = state.payments.get_proof(id, &actor).await?;
    Ok(Json(proof.into()))
}

pub async fn set_payment_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentStatusRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let status = PaymentStatus::try_from(request.status.as_str()).map_err(|_| {
        ApiError::bad_request(
            "unknown payment status",
            Some(format!("`{}` is not a payment status", request.status)),
        )
    })?;
    let updated = state.payments.set_status(id, &actor, status).await?;
    Ok(Json(updated.into()))
}
