//! Operation-wide cryptographic parameters
//!
//! Rather than module-level constants, the iteration count and salt size
//! travel in an explicit struct so tests can lower the KDF cost without
//! process-wide side effects.

/// Parameters shared by one encrypt or decrypt operation.
///
/// The salt length determines where the container file splits into
/// salt and token, so both sides of a round trip must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoParams {
    /// PBKDF2 iteration count. Deliberately high to slow down offline
    /// passphrase guessing.
    pub kdf_iterations: u32,
    /// Length in bytes of the random salt prefixed to the container.
    pub salt_len: usize,
}

impl Default for CryptoParams {
    fn default() -> Self {
        Self {
            kdf_iterations: 390_000,
            salt_len: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CryptoParams::default();
        assert_eq!(params.kdf_iterations, 390_000);
        assert_eq!(params.salt_len, 16);
    }
}
