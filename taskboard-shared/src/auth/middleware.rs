/// Bearer-token authentication
///
/// [`authenticate`] reads `Authorization: Bearer <token>`, validates it as an
/// access token and yields the caller's [`AuthContext`]. The API's auth layer
/// inserts that context into the request extensions; handlers then receive
/// the caller's identity explicitly through `Extension<AuthContext>` and pass
/// `auth.user_id` into every service call.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use taskboard_shared::auth::middleware::authenticate;
/// use taskboard_shared::ids::UserId;
///
/// let secret = "a-signing-secret-of-at-least-32-bytes";
/// let claims = Claims::new(UserId::new(), "ada@example.com", "Ada", TokenType::Access);
/// let token = create_token(&claims, secret).unwrap();
///
/// let mut headers = HeaderMap::new();
/// let value = HeaderValue::from_str(&format!("Bearer {}", token)).unwrap();
/// headers.insert(header::AUTHORIZATION, value);
///
/// let auth = authenticate(&headers, secret).unwrap();
/// assert_eq!(auth.name, "Ada");
/// ```

use axum::http::{header, HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::ids::UserId;

/// Authenticated caller, added to request extensions by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves the caller from request headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;
    Ok(AuthContext::from_claims(claims))
}
