//! On-disk container format
//!
//! A container file is `salt || token`: the raw salt bytes followed by the
//! sealed token. The salt length is fixed and known to both sides, so the
//! split point is unambiguous without any framing.

use crate::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `salt || token` to `path` atomically.
///
/// The bytes land in a temp file in the destination directory, get flushed
/// and fsynced, then rename into place, so a crash or error mid-write never
/// leaves a partial container behind. Created with mode 0o600 on Unix.
pub fn write(path: &Path, salt: &[u8], token: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", parent.display()),
            e,
        )
    })?;

    temp_file.write_all(salt).and_then(|_| temp_file.write_all(token.as_bytes())).map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                SafeboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Read a container file and split it into (salt, token).
///
/// Fails with `InvalidContainer` when the file is shorter than `salt_len`.
/// This check happens before any key derivation is attempted.
pub fn read(path: &Path, salt_len: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let data = fs::read(path).map_err(|e| {
        let category = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorCategory::User
        } else {
            ErrorCategory::Internal
        };
        SafeboxError::with_kind_and_source(
            category,
            ErrorKind::Io,
            format!("failed to read from {}", path.display()),
            e,
        )
    })?;

    if data.len() < salt_len {
        return Err(SafeboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidContainer,
            format!(
                "container too short: {} bytes, need at least {} for the salt",
                data.len(),
                salt_len
            ),
        ));
    }

    let (salt, token) = data.split_at(salt_len);
    Ok((salt.to_vec(), token.to_vec()))
}
