/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the registration password rule
/// - [`jwt`]: access and refresh token issuance and validation
/// - [`middleware`]: bearer-token middleware and [`AuthContext`](middleware::AuthContext)
/// - [`authorization`]: owner/member checks against a loaded board
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use taskboard_shared::ids::UserId;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Sup3rSecret")?;
/// assert!(verify_password("Sup3rSecret", &hash)?);
///
/// let claims = Claims::new(UserId::new(), "ada@example.com", "Ada", TokenType::Access);
/// let token = create_token(&claims, "a-signing-secret-of-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
