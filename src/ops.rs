//! Encrypt/decrypt orchestration
//!
//! Sequences the pipeline: pack -> derive -> seal -> write container, and
//! the reverse. Each call is independent and stateless; the packed
//! plaintext is staged in a zeroized in-memory buffer, never on disk, so
//! no failure path can leak a plaintext copy.

use crate::archive;
use crate::confirm::OverwriteConfirmer;
use crate::container;
use crate::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use crate::kdf;
use crate::params::CryptoParams;
use crate::passphrase::PassphraseReader;
use crate::sealing;
use rand::RngCore;
use rand::rngs::OsRng;
use std::path::Path;

/// How the source tree is reduced to one byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackMode {
    /// Deflate-compressed archive preserving relative paths. Fully
    /// restorable.
    Archive,
    /// Raw concatenation of file bytes. Lossy: names and structure are
    /// gone and the result cannot be unpacked. See [`archive::pack_flat`].
    Flat,
}

/// What an encrypt call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptOutcome {
    /// The container was written.
    Written,
    /// The output file existed and the confirmer declined to overwrite it.
    /// Nothing was written.
    Aborted,
}

/// Receives purely presentational stage announcements. No control flow
/// depends on it.
pub trait ProgressSink {
    fn stage(&mut self, stage: &str);
}

/// Discards all progress (for library callers and tests).
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn stage(&mut self, _stage: &str) {}
}

/// Encrypt a directory into a single container file.
///
/// Packs `source_dir` (per `mode`), derives a key from the passphrase and
/// a fresh random salt, seals the packed bytes, and writes
/// `salt || token` to `out_path` atomically. If `out_path` already exists
/// the confirmer is asked first; a declined overwrite returns
/// [`EncryptOutcome::Aborted`] with the existing file untouched.
pub fn encrypt_dir(
    source_dir: &Path,
    out_path: &Path,
    mode: PackMode,
    params: &CryptoParams,
    passphrase_reader: &mut dyn PassphraseReader,
    confirmer: &mut dyn OverwriteConfirmer,
    progress: &mut dyn ProgressSink,
) -> Result<EncryptOutcome> {
    if !source_dir.is_dir() {
        return Err(SafeboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::SourceNotFound,
            format!("source directory not found: {}", source_dir.display()),
        ));
    }

    progress.stage("packing");
    let plaintext = match mode {
        PackMode::Archive => archive::pack(source_dir)?,
        PackMode::Flat => archive::pack_flat(source_dir)?,
    };

    let passphrase = passphrase_reader.read_passphrase()?;

    progress.stage("encrypting");
    let mut salt = vec![0u8; params.salt_len];
    OsRng.fill_bytes(&mut salt);
    let key = kdf::derive_key(&passphrase, &salt, params.kdf_iterations);
    let token = sealing::seal(&key, &plaintext)?;

    if out_path.exists() && !confirmer.confirm_overwrite(out_path)? {
        return Ok(EncryptOutcome::Aborted);
    }

    progress.stage("writing");
    container::write(out_path, &salt, &token)?;
    Ok(EncryptOutcome::Written)
}

/// Decrypt a container file into a directory.
///
/// Splits the container into salt and token, derives the key, opens the
/// token, and unpacks the archive into `dest_dir` (created if absent).
/// Authentication is verified before `dest_dir` is touched, so a wrong
/// passphrase or tampered container leaves no trace on disk.
pub fn decrypt_file(
    in_path: &Path,
    dest_dir: &Path,
    params: &CryptoParams,
    passphrase_reader: &mut dyn PassphraseReader,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    if !in_path.is_file() {
        return Err(SafeboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::SourceNotFound,
            format!("container file not found: {}", in_path.display()),
        ));
    }

    let (salt, token) = container::read(in_path, params.salt_len)?;
    let passphrase = passphrase_reader.read_passphrase()?;

    progress.stage("decrypting");
    let key = kdf::derive_key(&passphrase, &salt, params.kdf_iterations);
    let plaintext = sealing::open(&key, &token)?;

    progress.stage("extracting");
    archive::unpack(&plaintext, dest_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::ConstantConfirmer;
    use crate::passphrase::ConstantPassphraseReader;
    use std::fs;
    use tempfile::TempDir;

    fn test_params() -> CryptoParams {
        CryptoParams {
            kdf_iterations: 1_000,
            ..CryptoParams::default()
        }
    }

    fn reader(passphrase: &[u8]) -> ConstantPassphraseReader {
        ConstantPassphraseReader::new(passphrase.to_vec())
    }

    #[test]
    fn test_missing_source_dir() {
        let tmp = TempDir::new().unwrap();
        let err = encrypt_dir(
            &tmp.path().join("nope"),
            &tmp.path().join("out.bin"),
            PackMode::Archive,
            &test_params(),
            &mut reader(b"pw"),
            &mut ConstantConfirmer(true),
            &mut SilentProgress,
        )
        .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::SourceNotFound));
        assert!(!tmp.path().join("out.bin").exists());
    }

    #[test]
    fn test_source_is_file_not_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let err = encrypt_dir(
            &file,
            &tmp.path().join("out.bin"),
            PackMode::Archive,
            &test_params(),
            &mut reader(b"pw"),
            &mut ConstantConfirmer(true),
            &mut SilentProgress,
        )
        .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::SourceNotFound));
    }

    #[test]
    fn test_missing_container_file() {
        let tmp = TempDir::new().unwrap();
        let err = decrypt_file(
            &tmp.path().join("nope.bin"),
            &tmp.path().join("out"),
            &test_params(),
            &mut reader(b"pw"),
            &mut SilentProgress,
        )
        .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::SourceNotFound));
    }

    #[test]
    fn test_declined_overwrite_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.txt"), b"data").unwrap();

        let out = tmp.path().join("out.bin");
        fs::write(&out, b"previous contents").unwrap();

        let outcome = encrypt_dir(
            &src,
            &out,
            PackMode::Archive,
            &test_params(),
            &mut reader(b"pw"),
            &mut ConstantConfirmer(false),
            &mut SilentProgress,
        )
        .unwrap();

        assert_eq!(outcome, EncryptOutcome::Aborted);
        assert_eq!(fs::read(&out).unwrap(), b"previous contents");
    }

    #[test]
    fn test_confirmed_overwrite_writes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.txt"), b"data").unwrap();

        let out = tmp.path().join("out.bin");
        fs::write(&out, b"previous contents").unwrap();

        let outcome = encrypt_dir(
            &src,
            &out,
            PackMode::Archive,
            &test_params(),
            &mut reader(b"pw"),
            &mut ConstantConfirmer(true),
            &mut SilentProgress,
        )
        .unwrap();

        assert_eq!(outcome, EncryptOutcome::Written);
        assert_ne!(fs::read(&out).unwrap(), b"previous contents");
    }

    #[test]
    fn test_progress_stages_reported() {
        struct Recorder(Vec<String>);
        impl ProgressSink for Recorder {
            fn stage(&mut self, stage: &str) {
                self.0.push(stage.to_string());
            }
        }

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.txt"), b"data").unwrap();

        let mut recorder = Recorder(Vec::new());
        encrypt_dir(
            &src,
            &tmp.path().join("out.bin"),
            PackMode::Archive,
            &test_params(),
            &mut reader(b"pw"),
            &mut ConstantConfirmer(true),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(recorder.0, vec!["packing", "encrypting", "writing"]);
    }
}
