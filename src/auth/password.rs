use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use std::sync::OnceLock;

use crate::auth::errors::AuthError;

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Runs a full verification against a throwaway hash and always returns `false`.
///
/// Used when no account matches a login so both outcomes cost one argon2 pass.
pub fn verify_dummy_password(password: &str) -> bool {
    let hash = DUMMY_HASH.get_or_init(|| hash_password("dummy-password-0").ok());
    if let Some(hash) = hash {
        let _ = verify_password(password, hash);
    }
    false
}
