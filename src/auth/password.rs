//! Member password handling
//!
//! Argon2id hashing plus the signup password policy. Stored hashes are
//! PHC strings, so the salt and cost parameters travel with each member
//! row and can be tightened later without a migration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::WilbeError;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 8;
/// Cap on password length; argon2 hashes the whole input, so an
/// unbounded password is an easy way to burn server CPU
pub const MAX_PASSWORD_LEN: usize = 128;

/// Check a candidate password against the signup policy
pub fn validate_new_password(password: &str) -> Result<(), WilbeError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(WilbeError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(WilbeError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a password for storage on the member row
pub fn hash_password(password: &str) -> Result<String, WilbeError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WilbeError::Auth(format!("Failed to hash password: {e}")))
}

/// Verify a login attempt against the stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, WilbeError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| WilbeError::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).unwrap();

        // Hash should be in PHC format
        assert!(hash.starts_with("$argon2"));

        // Correct password should verify
        assert!(verify_password(password, &hash).unwrap());

        // Wrong password should not verify
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_different_salts() {
        let password = "same-password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Same password should produce different hashes (different salts)
        assert_ne!(hash1, hash2);

        // Both should verify
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "not-a-valid-hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_password_policy_bounds() {
        assert!(validate_new_password("1234567").is_err());
        assert!(validate_new_password("12345678").is_ok());
        assert!(validate_new_password(&"x".repeat(MAX_PASSWORD_LEN)).is_ok());
        assert!(validate_new_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn test_policy_rejections_are_validation_errors() {
        match validate_new_password("short") {
            Err(WilbeError::Validation(msg)) => assert!(msg.contains("at least")),
            other => panic!("expected a validation error, got {:?}", other.err()),
        }
    }
}
