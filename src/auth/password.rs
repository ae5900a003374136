use bcrypt::{hash as bcrypt_hash, verify as bcrypt_verify, DEFAULT_COST};

pub fn hash(password: &str) -> anyhow::Result<String> {
    Ok(bcrypt_hash(password, DEFAULT_COST)?)
}

/// Verify a password against a stored hash. A malformed stored hash counts
/// as a failed verification, not an error.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    bcrypt_verify(password, stored_hash).unwrap_or(false)
}
