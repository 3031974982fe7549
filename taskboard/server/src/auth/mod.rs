use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::Config;

pub mod api;

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(user_id: String) -> Self {
        Self { user_id }
    }
}

/// Authentication state containing the JWT secret.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,  // Expiry time of the token
    pub iat: usize,  // Issued at time of the token
    pub sub: String, // ID of the user who owns the token
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carried no usable bearer token.
    #[error("Authentication required to access this resource")]
    Unauthenticated,
    /// Represents an error during JWT operations.
    /// The specific `jsonwebtoken::errors::Error` is captured as the source of this error.
    #[error("JWT operation failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, error) = match self {
            AuthError::Unauthenticated => (axum::http::StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::Jwt(ref err) => {
                tracing::error!("JWT operation failed: {}", err);
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "JWT_ERROR")
            }
        };
        (
            status_code,
            axum::Json(crate::web::api::v1::ErrorResponse::new(
                error,
                self.to_string(),
            )),
        )
            .into_response()
    }
}

/// Signs a token for `user_id` that [`decode_jwt`] accepts.
///
/// The server itself only verifies tokens. This is the signing half for the
/// service that issues them and for the integration tests under `tests/`,
/// which live outside the crate and cannot reach `#[cfg(test)]` items.
pub async fn encode_jwt(user_id: String, jwt_secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(TOKEN_LIFETIME_HOURS);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        sub: user_id,
    };
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub async fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
