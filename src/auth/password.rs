//! Password hashing using Argon2id
//!
//! Hashes are stored in PHC string format, so the parameters and salt travel
//! with the hash and verification needs no extra context.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use super::AuthError;

#[derive(Clone, Default)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] on a cryptographic failure.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored hash
    ///
    /// Uses constant-time comparison. A mismatch is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if the stored hash is not a valid PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Hashing(format!("invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("Str0ng!pass").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Str0ng!pass", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::default();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let hasher = PasswordHasher::default();
        assert!(hasher.verify("password", "plaintext").is_err());
    }
}
