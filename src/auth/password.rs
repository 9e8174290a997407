use crate::error::AppError;

/// bcrypt work factor for new hashes. Stored hashes carry their own cost,
/// so raising this only affects passwords set afterwards.
pub const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// True when `password` matches `stored_hash`.
///
/// A stored hash bcrypt cannot read counts as a mismatch, so a corrupted row
/// fails login with 401 like a wrong password.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or_else(|e| {
        log::warn!("unreadable password hash: {}", e);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("correct horse").unwrap();

        assert!(hashed.starts_with(&format!("$2b${}$", BCRYPT_COST)));
        assert!(verify_password("correct horse", &hashed));
        assert!(!verify_password("battery staple", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same password", &second));
    }

    #[test]
    fn test_unreadable_hash_is_a_mismatch() {
        assert!(!verify_password("test_password123", "invalidhashformat"));
        assert!(!verify_password("test_password123", ""));
    }
}
