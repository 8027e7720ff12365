//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10). Salted, so two hashes of the same
/// input differ.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let hash = hash_password("Secret1!").expect("hash");
        assert!(verify_password("Secret1!", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("Secret1!").expect("hash");
        assert!(!verify_password("WrongSecret1!", &hash).expect("verify"));
    }

    #[test]
    fn hashing_is_salted() {
        let a = hash_password("Secret1!").expect("hash");
        let b = hash_password("Secret1!").expect("hash");
        assert_ne!(a, b);
    }
}
