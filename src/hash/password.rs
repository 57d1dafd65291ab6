use sha1::{Digest, Sha1};

use super::Error;

/// Hash a credential for storage and comparison.
///
/// SHA-1 over `password || salt || principal_id`, hex encoded. The digest is
/// kept for compatibility with hashes already stored on user records.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when `principal_id` or `salt` is empty.
/// An empty `password` is accepted and means "no credential".
pub fn hash_password(principal_id: &str, password: &str, salt: &str) -> Result<String, Error> {
    if principal_id.is_empty() {
        return Err(Error::InvalidArgument("principal id is required"));
    }
    if salt.is_empty() {
        return Err(Error::InvalidArgument("salt is required"));
    }

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(principal_id.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
