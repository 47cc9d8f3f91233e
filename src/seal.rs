//! Sealing and opening messages
//!
//! The two operations the rest of the world calls. `seal` draws a
//! fresh salt, derives a key, encrypts, and packs; `open` unpacks,
//! re-derives the key from the payload's own parameters, and decrypts.
//! Every call is independent: no session, no globals, no retries.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::cipher;
use crate::error::{ErrorCategory, ErrorKind, HushlinkError, Result};
use crate::kdf::{self, DEFAULT_ITERATIONS, KDF_PBKDF2_SHA256, SALT_LEN};
use crate::payload::{self, FORMAT_VERSION, SealedPayload};

/// Seal a message with a password using the default iteration count.
///
/// Returns a URL-safe string suitable for a single query parameter.
pub fn seal(message: &str, password: &str) -> Result<String> {
    seal_with_iterations(message, password, DEFAULT_ITERATIONS)
}

/// Seal a message with a password and an explicit KDF work factor.
///
/// The iteration count is recorded in the payload, so tokens sealed
/// with a non-default count open without any extra coordination.
pub fn seal_with_iterations(message: &str, password: &str, iterations: u32) -> Result<String> {
    if message.is_empty() {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "message must not be empty",
        ));
    }

    if password.is_empty() {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "password must not be empty",
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key = kdf::derive_key(password, &salt, iterations)?;
    let ciphertext_token = cipher::encrypt(message.as_bytes(), &key)?;

    payload::pack(&SealedPayload {
        version: FORMAT_VERSION,
        kdf_id: KDF_PBKDF2_SHA256.to_string(),
        iterations,
        salt,
        ciphertext_token,
    })
}

/// Seal a message using a provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use `seal()` or
/// `seal_with_iterations()`, which generate a random salt and nonce.
pub fn seal_deterministic(
    message: &str,
    password: &str,
    iterations: u32,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; cipher::NONCE_LEN],
) -> Result<String> {
    if message.is_empty() {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "message must not be empty",
        ));
    }

    let key = kdf::derive_key(password, salt, iterations)?;
    let ciphertext_token = cipher::encrypt_with_nonce(message.as_bytes(), &key, nonce)?;

    payload::pack(&SealedPayload {
        version: FORMAT_VERSION,
        kdf_id: KDF_PBKDF2_SHA256.to_string(),
        iterations,
        salt: *salt,
        ciphertext_token,
    })
}

/// Open a packed token with a password, returning the message.
///
/// The key is derived from the payload's own salt, iteration count and
/// KDF identifier rather than any global default, so tokens sealed
/// under older defaults keep opening. Expected failure kinds are
/// `MalformedPayload` (the token is not a sealed message) and
/// `AuthenticationFailed` (wrong password or tampering); anything else
/// is a programming error and propagates as-is.
pub fn open(packed: &str, password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "password must not be empty",
        ));
    }

    let payload = payload::unpack(packed)?;

    if payload.kdf_id != KDF_PBKDF2_SHA256 {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!(
                "payload uses key derivation scheme {:?}, which is not supported",
                payload.kdf_id
            ),
        ));
    }

    let key = kdf::derive_key(password, &payload.salt, payload.iterations)?;

    // A ciphertext token too short to hold a nonce and tag is a
    // malformed payload from the caller's point of view, not invalid
    // caller input.
    let plaintext = cipher::decrypt(&payload.ciphertext_token, &key).map_err(|e| {
        if e.kind == Some(ErrorKind::InvalidInput) {
            HushlinkError::with_kind(
                ErrorCategory::User,
                ErrorKind::MalformedPayload,
                "ciphertext token is too short to be a sealed message",
            )
        } else {
            e
        }
    })?;

    String::from_utf8(plaintext).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            "sealed content is not valid UTF-8 text",
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep the KDF cheap in tests; correctness does not depend on the
    // work factor.
    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_roundtrip() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();
        let message = open(&packed, "sunflower42").unwrap();

        assert_eq!(message, "Happy birthday");
    }

    #[test]
    fn test_roundtrip_default_iterations() {
        let packed = seal("Happy birthday", "sunflower42").unwrap();

        assert_eq!(open(&packed, "sunflower42").unwrap(), "Happy birthday");
    }

    #[test]
    fn test_roundtrip_unicode() {
        let message = "Привет 🌻 — see you at 7";
        let packed = seal_with_iterations(message, "café", TEST_ITERATIONS).unwrap();

        assert_eq!(open(&packed, "café").unwrap(), message);
    }

    #[test]
    fn test_wrong_password() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();

        let err = open(&packed, "wrongpass").expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_salt_uniqueness() {
        let p1 = seal_with_iterations("same message", "same password", TEST_ITERATIONS).unwrap();
        let p2 = seal_with_iterations("same message", "same password", TEST_ITERATIONS).unwrap();

        // No deterministic leakage of repeated plaintext
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_empty_message() {
        let err = seal("", "sunflower42").expect_err("expected empty message to be rejected");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_empty_password() {
        let err = seal("Happy birthday", "").expect_err("expected empty password to be rejected");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_open_empty_password() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();

        let err = open(&packed, "").expect_err("expected empty password to be rejected");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_malformed_link() {
        let err = open("not-valid-base64!!", "sunflower42").expect_err("expected codec failure");
        assert_eq!(err.kind, Some(ErrorKind::MalformedPayload));
    }

    /// Mutating any single character of the packed string must never
    /// yield an altered plaintext; it fails as either a malformed
    /// payload or an authentication failure.
    #[test]
    fn test_tampered_packed_string() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();
        let bytes = packed.as_bytes();

        for i in 0..bytes.len() {
            let mut mutated = bytes.to_vec();
            mutated[i] = if mutated[i] == b'A' { b'B' } else { b'A' };
            let mutated = String::from_utf8(mutated).unwrap();

            match open(&mutated, "sunflower42") {
                Ok(message) => assert_eq!(
                    message, "Happy birthday",
                    "tampering must never alter the message"
                ),
                Err(err) => assert!(
                    matches!(
                        err.kind,
                        Some(ErrorKind::MalformedPayload) | Some(ErrorKind::AuthenticationFailed)
                    ),
                    "unexpected failure kind {:?} at byte {}",
                    err.kind,
                    i
                ),
            }
        }
    }

    /// Flipping a byte inside the decoded ciphertext token fails
    /// authentication.
    #[test]
    fn test_tampered_ciphertext_token() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();
        let mut payload = payload::unpack(&packed).unwrap();

        let last = payload.ciphertext_token.len() - 1;
        payload.ciphertext_token[last] ^= 0x01;
        let repacked = payload::pack(&payload).unwrap();

        let err = open(&repacked, "sunflower42").expect_err("expected tamper to be detected");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_truncated_ciphertext_token() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();
        let mut payload = payload::unpack(&packed).unwrap();

        payload.ciphertext_token.truncate(4);
        let repacked = payload::pack(&payload).unwrap();

        let err = open(&repacked, "sunflower42").expect_err("expected truncation to be detected");
        assert_eq!(err.kind, Some(ErrorKind::MalformedPayload));
    }

    #[test]
    fn test_foreign_kdf_rejected() {
        let packed = seal_with_iterations("Happy birthday", "sunflower42", TEST_ITERATIONS).unwrap();
        let mut payload = payload::unpack(&packed).unwrap();

        payload.kdf_id = "argon2id".to_string();
        let repacked = payload::pack(&payload).unwrap();

        let err = open(&repacked, "sunflower42").expect_err("expected unsupported KDF error");
        assert_eq!(err.kind, Some(ErrorKind::MalformedPayload));
    }

    #[test]
    fn test_deterministic_seal() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; cipher::NONCE_LEN];

        let p1 = seal_deterministic("hello", "pw", TEST_ITERATIONS, &salt, &nonce).unwrap();
        let p2 = seal_deterministic("hello", "pw", TEST_ITERATIONS, &salt, &nonce).unwrap();

        assert_eq!(p1, p2);
        assert_eq!(open(&p1, "pw").unwrap(), "hello");
    }

    /// The payload records the iteration count it was sealed with, so
    /// `open` never consults the current default.
    #[test]
    fn test_open_uses_payload_iterations() {
        let packed = seal_with_iterations("future proof", "pw", 2_500).unwrap();
        let payload = payload::unpack(&packed).unwrap();

        assert_eq!(payload.iterations, 2_500);
        assert_eq!(open(&packed, "pw").unwrap(), "future proof");
    }
}
