use axum::Router;
use axum::extract::MatchedPath;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AuthState;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::task::TaskState;
use crate::task::store::SeaOrmTaskStore;
use crate::verification::{LogCodeSender, VerificationCodeStore, VerificationState};

pub mod api;

/// Routes whose request spans are flagged and carry no headers.
const SENSITIVE_PATHS: [&str; 1] = ["/api/v1/verify-email"];

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let auth_state = Arc::new(AuthState::from_config(&config));
    let task_state = TaskState {
        store: Arc::new(SeaOrmTaskStore::new(db)),
        clock: clock.clone(),
    };
    let verification_state = VerificationState {
        store: Arc::new(VerificationCodeStore::new(clock)),
        sender: Arc::new(LogCodeSender),
    };

    let app = create_app(auth_state, task_state, verification_state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assembles every route with the shared tracing and CORS layers.
pub fn create_app(
    auth_state: Arc<AuthState>,
    task_state: TaskState,
    verification_state: VerificationState,
) -> Router {
    let public_routes = Router::new().route("/health", axum::routing::get(health_check_handler));

    Router::new()
        .merge(public_routes)
        .merge(api::create_api_router(
            auth_state,
            task_state,
            verification_state,
        ))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Span maker that marks verification requests as sensitive.
#[derive(Clone, Debug)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if SENSITIVE_PATHS.contains(&uri.path()) {
            tracing::info_span!(
                "request",
                method = %method,
                path = %uri.path(),
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::encode_jwt;
    use crate::clock::ManualClock;
    use crate::task::store::MockTaskStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    fn test_app(store: MockTaskStore) -> Router {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap(),
        ));
        let auth_state = Arc::new(AuthState {
            jwt_secret: "test_secret".to_string(),
        });
        let task_state = TaskState {
            store: Arc::new(store),
            clock: clock.clone(),
        };
        let verification_state = VerificationState {
            store: Arc::new(VerificationCodeStore::new(clock)),
            sender: Arc::new(LogCodeSender),
        };
        create_app(auth_state, task_state, verification_state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn can_report_health() {
        let response = test_app(MockTaskStore::new())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn can_serve_openapi_document() {
        let response = test_app(MockTaskStore::new())
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("/api/v1/tasks/daily-time-spent"));
        assert!(body.contains("/api/v1/verify-email"));
    }

    #[tokio::test]
    async fn can_reject_task_listing_without_token() {
        let response = test_app(MockTaskStore::new())
            .oneshot(Request::get("/api/v1/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("UNAUTHORIZED"));
    }

    #[tokio::test]
    async fn can_hide_database_errors_behind_generic_message() {
        let mut store = MockTaskStore::new();
        store
            .expect_list_tasks()
            .returning(|_, _| Err(sea_orm::DbErr::Custom("connection reset".to_string())));
        let token = encode_jwt("user-1".to_string(), "test_secret")
            .await
            .unwrap();

        let response = test_app(store)
            .oneshot(
                Request::get("/api/v1/tasks")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("INTERNAL_ERROR"));
        assert!(!body.contains("connection reset"));
    }

    #[tokio::test]
    async fn can_verify_email_without_token() {
        let response = test_app(MockTaskStore::new())
            .oneshot(
                Request::post("/api/v1/verify-email")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"email":"a@example.com","code":"123456"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("INVALID_CODE"));
    }
}
