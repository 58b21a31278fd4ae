//! Passphrase-based key derivation
//!
//! Derives a 32-byte symmetric key from (passphrase, salt) using
//! PBKDF2-HMAC-SHA256, then re-encodes it as padded URL-safe base64,
//! which is the textual key form the Fernet primitive expects.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Length of the raw derived key in bytes, pre-encoding.
pub const KEY_LEN: usize = 32;

/// Derive a Fernet-ready key from a passphrase and salt.
///
/// Deterministic: identical inputs always produce identical keys. The salt
/// binds the key to one container; the iteration count imposes deliberate
/// cost against brute-force passphrase guessing.
///
/// # Panics
///
/// Panics on an empty salt or a zero iteration count. Both are programming
/// errors, not recoverable conditions.
pub fn derive_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<String> {
    assert!(!salt.is_empty(), "salt must be non-empty");
    assert!(iterations > 0, "iteration count must be positive");

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut *key);

    Zeroizing::new(URL_SAFE.encode(&*key))
}
