use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    task::{self, TaskState},
    verification::{self, VerificationState},
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower::ServiceBuilder;
use utoipa::OpenApi;

pub mod v1 {
    use serde::Serialize;
    use utoipa::ToSchema;

    /// JSON response for API errors
    #[derive(Serialize, Debug, ToSchema)]
    pub struct ErrorResponse {
        /// Machine-readable error code
        pub error: String,
        /// Human-readable description
        pub message: String,
    }

    impl ErrorResponse {
        pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
            Self {
                error: error.into(),
                message: message.into(),
            }
        }
    }

    /// JSON response carrying only a message
    #[derive(Serialize, Debug, ToSchema)]
    pub struct MessageResponse {
        pub message: String,
    }

    impl MessageResponse {
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        task::api::v1::create_task_handler,
        task::api::v1::list_tasks_handler,
        task::api::v1::get_task_handler,
        task::api::v1::update_task_handler,
        task::api::v1::delete_task_handler,
        task::api::v1::daily_time_spent_handler,
        task::api::v1::task_status_handler,
        task::api::v1::dashboard_handler,
        verification::api::v1::send_code_handler,
        verification::api::v1::verify_email_handler,
    ),
    components(schemas(v1::ErrorResponse, v1::MessageResponse)),
    tags(
        (name = "Tasks", description = "Task management"),
        (name = "Statistics", description = "Charts and dashboard figures"),
        (name = "Verification", description = "Email verification codes")
    )
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(
    auth_state: Arc<AuthState>,
    task_state: TaskState,
    verification_state: VerificationState,
) -> Router {
    let tasks_router = task::api::v1::create_api_router(task_state);
    let codes_router =
        verification::api::v1::create_protected_api_router(verification_state.clone());
    let protected_routes = tasks_router
        .merge(codes_router)
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    let public_routes = verification::api::v1::create_public_api_router(verification_state);
    let api_routes = public_routes.merge(protected_routes);
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}
