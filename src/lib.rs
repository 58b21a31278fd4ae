//! Safebox - passphrase-based directory encryption
//!
//! Packs a directory tree into a single byte stream, derives a key from a
//! passphrase via PBKDF2-HMAC-SHA256, seals the stream into a Fernet token,
//! and stores `salt || token` as one opaque container file. Decryption
//! reverses the pipeline and fails closed on a wrong passphrase or any
//! tampering.

#![forbid(unsafe_code)]

pub mod archive;
pub mod confirm;
pub mod container;
pub mod error;
pub mod kdf;
pub mod ops;
pub mod params;
pub mod passphrase;
pub mod sealing;
