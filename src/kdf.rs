//! Key derivation from a password and a per-message salt
//!
//! PBKDF2-HMAC-SHA256 turns a human password plus a random 16-byte salt
//! into a 32-byte symmetric key. The iteration count is tunable and is
//! recorded in the sealed payload, so old links stay openable when the
//! default is raised later.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::{ErrorCategory, ErrorKind, HushlinkError, Result};

/// Identifier of the key derivation scheme recorded in payloads.
pub const KDF_PBKDF2_SHA256: &str = "pbkdf2-sha256";

/// Default PBKDF2 iteration count.
///
/// Chosen to impose tens-of-milliseconds cost on commodity hardware,
/// making offline guessing against a captured token expensive.
pub const DEFAULT_ITERATIONS: u32 = 390_000;

/// Length of the per-message salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 32;

/// Derive a 32-byte key from a password, salt and iteration count.
///
/// Deterministic for a given (password, salt, iterations) triple; the
/// receiver re-derives the identical key from the payload's own salt
/// and iteration count. The cipher consumes the raw key bytes, so no
/// further key encoding is applied.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN], iterations: u32) -> Result<[u8; KEY_LEN]> {
    if password.is_empty() {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "password must not be empty",
        ));
    }

    if iterations == 0 {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "iteration count must be positive",
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);

    Ok(key)
}
