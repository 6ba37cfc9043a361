//! Registration, login and session tokens

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::jwt::{self, Claims, TokenType};
use crate::auth::password;
use crate::error::{ServiceError, ServiceResult};
use crate::ids::UserId;
use crate::models::{CreateUser, User, UserSummary};
use crate::store::BoardStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn BoardStore>,
    jwt_secret: Arc<str>,
}

impl Accounts {
    pub fn new(store: Arc<dyn BoardStore>, jwt_secret: impl Into<String>) -> Self {
        Self {
            store,
            jwt_secret: Arc::from(jwt_secret.into()),
        }
    }

    /// Creates a user and signs them in
    ///
    /// Fails with `Invalid` for a weak password and `Conflict` if the email
    /// is already registered (ignoring case).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ServiceResult<AuthResponse> {
        password::validate_password_strength(password).map_err(ServiceError::Invalid)?;

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = password::hash_password(password)?;

        // The store re-checks uniqueness, so a racing registration still
        // surfaces as Conflict
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
            })
            .await?;

        info!(user_id = %user.id, "Registered user");
        self.issue_tokens(&user)
    }

    /// Verifies credentials; unknown email and wrong password look the same
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthResponse> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !password::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.issue_tokens(&user)
    }

    /// Exchanges a refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> ServiceResult<String> {
        jwt::refresh_access_token(refresh_token, &self.jwt_secret)
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))
    }

    pub async fn profile(&self, user_id: UserId) -> ServiceResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    fn issue_tokens(&self, user: &User) -> ServiceResult<AuthResponse> {
        let access = Claims::new(user.id, &user.email, &user.name, TokenType::Access);
        let refresh = Claims::new(user.id, &user.email, &user.name, TokenType::Refresh);

        Ok(AuthResponse {
            user: user.summary(),
            access_token: jwt::create_token(&access, &self.jwt_secret)?,
            refresh_token: jwt::create_token(&refresh, &self.jwt_secret)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SECRET: &str = "accounts-test-secret-of-32-bytes!!";

    fn accounts() -> Accounts {
        Accounts::new(Arc::new(MemoryStore::new()), SECRET)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let accounts = accounts();

        let registered = accounts
            .register("ada@example.com", "Secret1", "Ada")
            .await
            .unwrap();
        assert_eq!(registered.user.email, "ada@example.com");

        let claims = jwt::validate_access_token(&registered.access_token, SECRET).unwrap();
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.name, "Ada");

        let logged_in = accounts.login("ada@example.com", "Secret1").await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_ignoring_case() {
        let accounts = accounts();
        accounts
            .register("ada@example.com", "Secret1", "Ada")
            .await
            .unwrap();

        let err = accounts
            .register("ADA@example.com", "Secret1", "Ada Again")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let err = accounts()
            .register("ada@example.com", "secret", "Ada")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let accounts = accounts();
        accounts
            .register("ada@example.com", "Secret1", "Ada")
            .await
            .unwrap();

        let unknown = accounts.login("nobody@example.com", "Secret1").await;
        assert!(matches!(unknown, Err(ServiceError::Unauthorized(_))));

        let wrong = accounts.login("ada@example.com", "Secret2").await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refresh_and_profile() {
        let accounts = accounts();
        let registered = accounts
            .register("ada@example.com", "Secret1", "Ada")
            .await
            .unwrap();

        let access = accounts.refresh(&registered.refresh_token).unwrap();
        let claims = jwt::validate_access_token(&access, SECRET).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        // An access token is not a refresh token
        assert!(matches!(
            accounts.refresh(&registered.access_token),
            Err(ServiceError::Unauthorized(_))
        ));

        let profile = accounts.profile(registered.user.id).await.unwrap();
        assert_eq!(profile.name, "Ada");
        assert!(matches!(
            accounts.profile(UserId::new()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
