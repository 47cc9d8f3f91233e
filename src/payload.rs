//! Versioned payload codec for sealed messages
//!
//! Serializes the sealed payload into a single string that is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in a URL query parameter with no further escaping
//! - Safe to pass unescaped in a POSIX shell
//!
//! The wire form is a compact JSON object
//! `{"v":1,"kdf":"pbkdf2-sha256","it":390000,"s":"...","t":"..."}`
//! wrapped in URL-safe base64. Encoding emits no padding; decoding
//! tolerates padded input, so payloads packed by implementations that
//! pad still unpack.
//!
//! The codec never interprets cryptographic validity; whether the
//! ciphertext token actually decrypts is the cipher's concern.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, ErrorKind, HushlinkError, Result};
use crate::kdf::SALT_LEN;

/// Current payload format version
pub const FORMAT_VERSION: u32 = 1;

/// URL-safe base64, unpadded on encode, padding-indifferent on decode.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The one entity that travels: everything `open` needs except the password.
///
/// Created once by `seal`, immutable, carried by the link itself. The
/// iteration count is recorded per payload rather than fixed globally,
/// so future defaults can increase without invalidating old links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Format version tag, currently [`FORMAT_VERSION`].
    pub version: u32,
    /// Key derivation scheme identifier, currently `"pbkdf2-sha256"`.
    pub kdf_id: String,
    /// KDF work factor used for this specific message.
    pub iterations: u32,
    /// Per-message random salt; not secret, never reused.
    pub salt: [u8; SALT_LEN],
    /// Opaque cipher token: nonce plus sealed box.
    pub ciphertext_token: Vec<u8>,
}

/// JSON wire form. Field names and declaration order are part of the
/// format and must not change within a format version.
#[derive(Serialize, Deserialize)]
struct WireForm {
    v: u32,
    kdf: String,
    it: u32,
    s: String,
    t: String,
}

/// Serialize a payload into a single URL-safe string.
pub fn pack(payload: &SealedPayload) -> Result<String> {
    let wire = WireForm {
        v: payload.version,
        kdf: payload.kdf_id.clone(),
        it: payload.iterations,
        s: B64.encode(payload.salt),
        t: B64.encode(&payload.ciphertext_token),
    };

    let raw = serde_json::to_vec(&wire).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::MalformedPayload,
            format!("payload serialization failed: {}", e),
            e,
        )
    })?;

    Ok(B64.encode(raw))
}

/// Exact inverse of [`pack`].
///
/// Surrounding whitespace is trimmed so copy-pasted links survive.
pub fn unpack(packed: &str) -> Result<SealedPayload> {
    let raw = B64.decode(packed.trim()).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("payload base64 decoding failed: {}", e),
            e,
        )
    })?;

    let wire: WireForm = serde_json::from_slice(&raw).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("payload structure is invalid: {}", e),
            e,
        )
    })?;

    if wire.v != FORMAT_VERSION {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("payload claims format version {}, which is not supported", wire.v),
        ));
    }

    if wire.it == 0 {
        return Err(HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            "payload iteration count must be positive",
        ));
    }

    let salt_bytes = B64.decode(&wire.s).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("salt base64 decoding failed: {}", e),
            e,
        )
    })?;
    let salt: [u8; SALT_LEN] = salt_bytes.try_into().map_err(|bytes: Vec<u8>| {
        HushlinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("salt must be {} bytes, got {}", SALT_LEN, bytes.len()),
        )
    })?;

    let ciphertext_token = B64.decode(&wire.t).map_err(|e| {
        HushlinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("ciphertext token base64 decoding failed: {}", e),
            e,
        )
    })?;

    Ok(SealedPayload {
        version: wire.v,
        kdf_id: wire.kdf,
        iterations: wire.it,
        salt,
        ciphertext_token,
    })
}
