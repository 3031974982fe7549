use crate::auth::{AuthError, AuthState, CurrentUser, decode_jwt};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// API authentication middleware that extracts the current user from Authorization Bearer header.
/// Sets the CurrentUser extension if a valid JWT token is found in the Authorization header.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        match decode_jwt(token, &state.jwt_secret).await {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(CurrentUser::new(claims.sub));
            }
            Err(err) => tracing::debug!("Ignoring invalid bearer token: {}", err),
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        return AuthError::Unauthenticated.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::encode_jwt;
    use crate::config::Config;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::StatusCode;
    use axum::middleware::{from_fn, from_fn_with_state};
    use tower::ServiceExt;

    fn test_app() -> (axum::Router, Arc<AuthState>) {
        let config = Config {
            db_url: "".to_string(),
            port: 8080,
            jwt_secret: "test_secret".to_string(),
        };
        let auth_state = Arc::new(AuthState::from_config(&config));

        // Layers are applied in reverse order (bottom to top)
        let app = axum::Router::new()
            .route(
                "/protected",
                axum::routing::get(|Extension(user): Extension<CurrentUser>| async move {
                    user.user_id
                }),
            )
            .layer(from_fn(require_auth_middleware))
            .layer(from_fn_with_state(auth_state.clone(), auth_user_middleware));
        (app, auth_state)
    }

    #[tokio::test]
    async fn can_reject_request_without_token() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn can_reject_request_with_garbage_token() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_middlewares_work_together() {
        let (app, auth_state) = test_app();
        let jwt_token = encode_jwt("user-7".to_string(), &auth_state.jwt_secret)
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("authorization", format!("Bearer {}", jwt_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "user-7");
    }
}
