use crate::verification::{VerificationError, VerificationState};
use crate::web::api::v1::{ErrorResponse, MessageResponse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// JSON request payload for issuing a verification code.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub email: String,
}

/// JSON request payload for redeeming a verification code.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            VerificationError::InvalidEmail => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            VerificationError::InvalidCode => (StatusCode::BAD_REQUEST, "INVALID_CODE"),
            VerificationError::Delivery(err) => {
                tracing::error!("Failed to deliver verification code: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "DELIVERY_ERROR")
            }
        };
        (status_code, Json(ErrorResponse::new(error, self.to_string()))).into_response()
    }
}

/// Handler for POST /api/v1/verification-codes - Issues and sends a code.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/verification-codes",
    request_body = SendCodeRequest,
    responses(
        (status = 202, description = "Verification code sent", body = MessageResponse),
        (status = 400, description = "Malformed email", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "Verification"
)]
pub async fn send_code_handler(
    State(state): State<VerificationState>,
    Json(payload): Json<SendCodeRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), VerificationError> {
    state.send_code(&payload.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Verification code sent")),
    ))
}

/// Handler for POST /api/v1/verify-email - Redeems a code.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse)
    ),
    tag = "Verification"
)]
pub async fn verify_email_handler(
    State(state): State<VerificationState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, VerificationError> {
    state.store.verify(&payload.email, &payload.code)?;
    tracing::info!("Verified email {}", payload.email);
    Ok(Json(MessageResponse::new("Email verified successfully!")))
}

/// Routes reachable without a token.
pub fn create_public_api_router(state: VerificationState) -> Router {
    Router::new()
        .route("/verify-email", post(verify_email_handler))
        .with_state(state)
}

/// Routes that need an authenticated user.
pub fn create_protected_api_router(state: VerificationState) -> Router {
    Router::new()
        .route("/verification-codes", post(send_code_handler))
        .with_state(state)
}
