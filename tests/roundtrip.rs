//! End-to-end pipeline properties
//!
//! Exercises the full encrypt/decrypt pipeline through the library API:
//! round trips, fail-closed authentication, tamper detection, salt
//! freshness, and cleanliness of the working directory after every path.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use safebox::confirm::ConstantConfirmer;
use safebox::error::ErrorKind;
use safebox::ops::{self, EncryptOutcome, PackMode, SilentProgress};
use safebox::params::CryptoParams;
use safebox::passphrase::ConstantPassphraseReader;

/// Low iteration count so the suite stays fast; the count changes cost,
/// not behavior.
fn test_params() -> CryptoParams {
    CryptoParams {
        kdf_iterations: 1_000,
        ..CryptoParams::default()
    }
}

fn encrypt(
    source: &Path,
    out: &Path,
    passphrase: &[u8],
    mode: PackMode,
) -> safebox::error::Result<EncryptOutcome> {
    ops::encrypt_dir(
        source,
        out,
        mode,
        &test_params(),
        &mut ConstantPassphraseReader::new(passphrase.to_vec()),
        &mut ConstantConfirmer(true),
        &mut SilentProgress,
    )
}

fn decrypt(input: &Path, dest: &Path, passphrase: &[u8]) -> safebox::error::Result<()> {
    ops::decrypt_file(
        input,
        dest,
        &test_params(),
        &mut ConstantPassphraseReader::new(passphrase.to_vec()),
        &mut SilentProgress,
    )
}

fn build_tree(root: &Path) {
    fs::write(root.join("a.txt"), b"hello").unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("b.txt"), b"world").unwrap();
}

#[test]
fn test_archive_roundtrip_reproduces_tree() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let container = tmp.path().join("out.bin");
    let restored = tmp.path().join("restored");

    encrypt(&src, &container, b"correct horse", PackMode::Archive).unwrap();
    decrypt(&container, &restored, b"correct horse").unwrap();

    assert_eq!(fs::read(restored.join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(restored.join("sub").join("b.txt")).unwrap(), b"world");
}

#[test]
fn test_roundtrip_binary_content() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    let payload: Vec<u8> = (0u8..=255).cycle().take(64 * 1024).collect();
    fs::write(src.join("blob.bin"), &payload).unwrap();

    let container = tmp.path().join("out.bin");
    let restored = tmp.path().join("restored");

    encrypt(&src, &container, b"pw", PackMode::Archive).unwrap();
    decrypt(&container, &restored, b"pw").unwrap();

    assert_eq!(fs::read(restored.join("blob.bin")).unwrap(), payload);
}

/// Flat mode is lossy by contract: the sealed payload is a bare
/// concatenation, so decryption authenticates fine but the payload does not
/// unpack into files. This documents the contract rather than a bug.
#[test]
fn test_flat_mode_is_lossy() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let container = tmp.path().join("out.bin");
    let restored = tmp.path().join("restored");

    encrypt(&src, &container, b"pw", PackMode::Flat).unwrap();
    let err = decrypt(&container, &restored, b"pw").unwrap_err();

    assert_eq!(err.kind, Some(ErrorKind::CorruptArchive));
    assert!(!restored.join("a.txt").exists());
}

#[test]
fn test_wrong_passphrase_fails_closed() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let container = tmp.path().join("out.bin");
    let restored = tmp.path().join("restored");

    encrypt(&src, &container, b"correct", PackMode::Archive).unwrap();
    let err = decrypt(&container, &restored, b"wrong").unwrap_err();

    assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    // Authentication happens before the destination is touched.
    assert!(!restored.exists());
}

#[test]
fn test_single_bit_flip_detected() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let container = tmp.path().join("out.bin");
    encrypt(&src, &container, b"pw", PackMode::Archive).unwrap();

    let original = fs::read(&container).unwrap();
    let salt_len = test_params().salt_len;

    // Flip one bit at several positions across the token portion.
    for (offset, bit) in [
        (salt_len, 0),
        (salt_len + 1, 7),
        (original.len() / 2, 3),
        (original.len() - 1, 0),
        (original.len() - 1, 7),
    ] {
        let mut tampered = original.clone();
        tampered[offset] ^= 1 << bit;
        fs::write(&container, &tampered).unwrap();

        let restored = tmp.path().join("restored");
        let err = decrypt(&container, &restored, b"pw").unwrap_err();
        assert_eq!(
            err.kind,
            Some(ErrorKind::AuthenticationFailed),
            "bit {} at offset {} went undetected",
            bit,
            offset
        );
        assert!(!restored.exists());
    }
}

#[test]
fn test_salt_and_ciphertext_fresh_per_encryption() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let first = tmp.path().join("first.bin");
    let second = tmp.path().join("second.bin");
    encrypt(&src, &first, b"pw", PackMode::Archive).unwrap();
    encrypt(&src, &second, b"pw", PackMode::Archive).unwrap();

    let a = fs::read(&first).unwrap();
    let b = fs::read(&second).unwrap();
    let salt_len = test_params().salt_len;

    assert_ne!(a[..salt_len], b[..salt_len], "salts must differ");
    assert_ne!(a[salt_len..], b[salt_len..], "ciphertexts must differ");
}

#[test]
fn test_short_container_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("short.bin");
    fs::write(&container, [0u8; 7]).unwrap();

    let restored = tmp.path().join("restored");
    let err = decrypt(&container, &restored, b"pw").unwrap_err();

    assert_eq!(err.kind, Some(ErrorKind::InvalidContainer));
    assert!(!restored.exists());
}

#[test]
fn test_empty_source_directory_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();

    let container = tmp.path().join("out.bin");
    let restored = tmp.path().join("restored");

    encrypt(&src, &container, b"pw", PackMode::Archive).unwrap();
    decrypt(&container, &restored, b"pw").unwrap();

    assert!(restored.is_dir());
    assert_eq!(fs::read_dir(&restored).unwrap().count(), 0);
}

/// After any operation, successful or not, the working directory holds only
/// the files we expect: no staged plaintext, no stray temp files.
#[test]
fn test_no_temporary_artifacts_left() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    build_tree(&src);

    let container = tmp.path().join("out.bin");
    encrypt(&src, &container, b"pw", PackMode::Archive).unwrap();

    let restored = tmp.path().join("restored");
    decrypt(&container, &restored, b"pw").unwrap();
    // A failing decrypt must not leave artifacts either.
    let _ = decrypt(&container, &tmp.path().join("never"), b"wrong");

    let mut names: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["out.bin", "restored", "src"]);
}
