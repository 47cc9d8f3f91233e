//! Hushlink - password-sealed message links
//!
//! Turns a short text message plus a shared password into a single
//! opaque, URL-safe token that anyone who knows the password can turn
//! back into the message. The token is self-describing: it carries the
//! format version, KDF parameters, salt, and ciphertext, so the link
//! itself is the only thing that needs to travel.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod password;
pub mod payload;
pub mod seal;
