//! Authenticated encryption of message bytes
//!
//! ChaCha20Poly1305 over a key derived by [`crate::kdf`]. The token
//! format is:
//! - nonce: 12 bytes
//! - sealed box: variable length (ciphertext plus 16-byte Poly1305 tag)
//!
//! A fresh random nonce is drawn per call. Nonce reuse across messages
//! is additionally ruled out by the per-message salt: every message is
//! encrypted under a distinct key.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{ErrorCategory, ErrorKind, HushlinkError, Result};
use crate::kdf::KEY_LEN;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the Poly1305 authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Encrypt plaintext under a derived key using a random nonce
///
/// Returns the token format: nonce(12) + sealedbox(variable)
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    encrypt_with_nonce(plaintext, key, &nonce)
}

/// Encrypt plaintext under a derived key using a provided nonce
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use `encrypt()` which
/// generates a random nonce.
pub fn encrypt_with_nonce(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(&(*key).into());

    let nonce_obj = Nonce::from(*nonce);
    let sealed_box = cipher.encrypt(&nonce_obj, plaintext).map_err(|_| {
        HushlinkError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CipherFailure,
            "encryption failed",
        )
    })?;

    let mut token = Vec::with_capacity(NONCE_LEN + sealed_box.len());
    token.extend_from_slice(nonce);
    token.extend_from_slice(&sealed_box);

    Ok(token)
}

/// Decrypt a token under a derived key, verifying integrity
///
/// Fails with `InvalidInput` when the token cannot possibly hold a
/// nonce and a tag, and with `AuthenticationFailed` when the tag does
/// not verify. A wrong password and a tampered token are deliberately
/// reported identically.
pub fn decrypt(token: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    if token.len() < NONCE_LEN + TAG_LEN {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "token too short to hold a nonce and an authentication tag",
        ));
    }

    let nonce: [u8; NONCE_LEN] = token[..NONCE_LEN]
        .try_into()
        .map_err(|_| {
            HushlinkError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::InvalidInput,
                "failed to read nonce",
            )
        })?;
    let sealed_box = &token[NONCE_LEN..];

    let cipher = ChaCha20Poly1305::new(&(*key).into());
    let nonce_obj = Nonce::from(nonce);
    let plaintext = cipher.decrypt(&nonce_obj, sealed_box).map_err(|_| {
        HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "wrong password or corrupted message",
        )
    })?;

    Ok(plaintext)
}
