//! bcrypt helpers.

use crate::error::AppError;

pub fn hash_password(plain: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::TEST_BCRYPT_COST;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("admin123", TEST_BCRYPT_COST).unwrap();
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("admin123", "not-a-bcrypt-hash"));
    }
}
