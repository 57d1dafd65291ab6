use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use utoipa::ToSchema;

use super::Error;

const ID_LENGTH: usize = 10;
const HASH_LENGTH: usize = 24;
const MAX_LENGTH: usize = 64;

/// Derive a fresh, non-reversible identifier from `seeds`.
///
/// The digest also covers 32 bytes from the OS random source and the current
/// time in nanoseconds, so identical seeds never produce the same output.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when `seeds` is empty or `length` is not
/// in `1..=64`, and [`Error::Random`] if the OS random source fails.
pub fn derive_hash<S: AsRef<str>>(seeds: &[S], length: usize) -> Result<String, Error> {
    if seeds.is_empty() {
        return Err(Error::InvalidArgument("at least one seed is required"));
    }
    if length == 0 || length > MAX_LENGTH {
        return Err(Error::InvalidArgument("length must be between 1 and 64"));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed.as_ref().as_bytes());
    }

    let mut salt = [0u8; 32];
    OsRng.try_fill_bytes(&mut salt)?;
    hasher.update(salt);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    hasher.update(nanos.to_string().as_bytes());

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(length);
    Ok(digest)
}

/// Correlation identifiers handed out per (user, key).
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IdHashPair {
    pub id: String,
    pub hash: String,
}

impl IdHashPair {
    /// Derive a new pair from `base` seeds plus request parameters.
    ///
    /// Parameters are folded in as `key=value` strings in key order.
    ///
    /// # Errors
    ///
    /// Propagates [`derive_hash`] failures.
    pub fn derive(base: &[String], params: &BTreeMap<String, String>) -> Result<Self, Error> {
        let mut seeds: Vec<String> = base.to_vec();
        seeds.extend(params.iter().map(|(key, value)| format!("{key}={value}")));

        Ok(Self {
            id: derive_hash(&seeds, ID_LENGTH)?,
            hash: derive_hash(&seeds, HASH_LENGTH)?,
        })
    }
}
