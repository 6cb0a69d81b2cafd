//! Authentication: password hashing, JWT issuance and the request guards
//! that protect routes.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use middleware::{AuthenticatedUser, require_admin, require_auth};
pub use password::PasswordHasher;

/// Role name granted full access.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid Authorization header format")]
    MalformedHeader,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Failed to hash password: {0}")]
    Hashing(String),
    #[error("Token lifetime is out of range")]
    LifetimeOverflow,
    #[error("Failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}
