//! Authenticated encryption of the packed plaintext
//!
//! Wraps the Fernet primitive. A sealed token is self-describing: it embeds
//! a format version byte, a creation timestamp, a fresh random IV, the
//! ciphertext, and an HMAC-SHA256 tag over all of it. The tag is verified
//! in constant time before any plaintext is released.
//!
//! The timestamp inside the token is informational only; no expiry is
//! enforced on open.

use crate::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use fernet::Fernet;
use zeroize::Zeroizing;

fn cipher_for_key(key: &str) -> Result<Fernet> {
    // The key comes from kdf::derive_key, so a reject here is a bug in
    // our own key handling rather than bad user input.
    Fernet::new(key).ok_or_else(|| {
        SafeboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "derived key was rejected by the cipher",
        )
    })
}

/// Seal plaintext under a derived key, returning the token.
///
/// Each call draws a fresh random IV, so sealing the same plaintext twice
/// under the same key yields different tokens.
pub fn seal(key: &str, plaintext: &[u8]) -> Result<String> {
    let cipher = cipher_for_key(key)?;
    Ok(cipher.encrypt(plaintext))
}

/// Open a sealed token, verifying its authentication tag first.
///
/// Fails closed with `AuthenticationFailed` on a wrong key, any bit
/// alteration, or a structurally malformed token. The three cases are
/// deliberately indistinguishable: the error reveals nothing about whether
/// the passphrase was "close".
pub fn open(key: &str, token: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let auth_failed = || {
        SafeboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "wrong passphrase, or tampered or corrupted data",
        )
    };

    // Tokens are ASCII base64url. Bytes outside that are corruption and
    // get the same error as a failed tag check.
    let token = std::str::from_utf8(token).map_err(|_| auth_failed())?;

    let cipher = cipher_for_key(key)?;
    let plaintext = cipher.decrypt(token).map_err(|_| auth_failed())?;
    Ok(Zeroizing::new(plaintext))
}
