//! HS256 access tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::AuthError;
use crate::config::MAX_TOKEN_LIFETIME_HOURS;

/// Claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Role name at the time of login
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    /// Lifetimes outside `1..=MAX_TOKEN_LIFETIME_HOURS` are clamped; the
    /// configuration loader rejects them before this point.
    #[must_use]
    pub fn new(secret: &str, lifetime_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation,
            lifetime: Duration::try_hours(lifetime_hours.clamp(1, MAX_TOKEN_LIFETIME_HOURS))
                .unwrap_or_else(Duration::zero),
        }
    }

    /// Issue a token for `user_id` expiring after the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if encoding fails and
    /// [`AuthError::LifetimeOverflow`] if the expiry is not representable.
    pub fn issue(&self, user_id: Uuid, role: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.lifetime)
            .ok_or(AuthError::LifetimeOverflow)?;
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// # Errors
    ///
    /// [`AuthError::Expired`] past `exp`, [`AuthError::InvalidToken`] for a
    /// bad signature or malformed token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }
}
