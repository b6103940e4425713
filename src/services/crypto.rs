use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::errors::StoreError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// Default parameters are the interactive-login work factor recommended
/// by the argon2 crate.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC-format hash.
///
/// Any parse or mismatch outcome is reported as `false`; callers translate
/// that into their own (deliberately generic) credential error.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
