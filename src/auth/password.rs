use bcrypt::{hash, verify, BcryptError};

/// Hashes `password` with a fresh random salt. The salt is embedded in the
/// returned bcrypt string.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

/// Checks `password` against a stored bcrypt hash. The comparison is constant-time.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, BcryptError> {
    verify(password, hashed_password)
}
