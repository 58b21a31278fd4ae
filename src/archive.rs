//! Directory tree packing and unpacking
//!
//! Reduces a directory tree to one byte stream and back. Archive mode uses
//! a deflate-compressed zip whose entry names are paths relative to the
//! source root; that relative-path convention is what lets `unpack` rebuild
//! the original layout. Only regular file contents and relative paths are
//! preserved - symlinks, empty directories, permissions and timestamps are
//! not.

use crate::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use walkdir::WalkDir;
use zeroize::Zeroizing;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn io_error(msg: impl Into<String>, err: std::io::Error) -> SafeboxError {
    let category = if err.kind() == std::io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    SafeboxError::with_kind_and_source(category, ErrorKind::Io, msg, err)
}

/// Walk `source_dir` and yield each regular file with its relative,
/// forward-slash entry name, in deterministic name order.
fn walk_files(source_dir: &Path) -> Result<Vec<(String, std::path::PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to walk {}", source_dir.display()),
                e,
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(source_dir).map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "walked path not under source directory",
                e,
            )
        })?;
        // Entry names use '/' regardless of platform so archives are
        // portable. Non-UTF-8 path components are encoded lossily.
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.path().to_path_buf()));
    }
    Ok(files)
}

/// Pack a directory tree into a deflate-compressed archive blob.
///
/// The result fully reconstructs the tree when passed to [`unpack`].
pub fn pack(source_dir: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in walk_files(source_dir)? {
        writer.start_file(name, options).map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to add {} to archive", path.display()),
                e,
            )
        })?;
        let contents =
            fs::read(&path).map_err(|e| io_error(format!("failed to read {}", path.display()), e))?;
        writer.write_all(&contents).map_err(|e| {
            io_error(format!("failed to write {} into archive", path.display()), e)
        })?;
    }

    let cursor = writer.finish().map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to finalize archive",
            e,
        )
    })?;
    Ok(Zeroizing::new(cursor.into_inner()))
}

/// Concatenate all file bytes in walk order, with no delimiters and no
/// path metadata.
///
/// **This mode is lossy.** The output cannot be split back into individual
/// files, and [`unpack`] will reject it as a corrupt archive. It exists
/// purely as a faster path for callers who only need the raw bytes
/// protected, not the tree structure. Do not use it for data you expect to
/// restore file-by-file.
pub fn pack_flat(source_dir: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let mut blob = Zeroizing::new(Vec::new());
    for (_, path) in walk_files(source_dir)? {
        let contents =
            fs::read(&path).map_err(|e| io_error(format!("failed to read {}", path.display()), e))?;
        blob.extend_from_slice(&contents);
    }
    Ok(blob)
}

/// Extract an archive blob produced by [`pack`] into `dest_dir`.
///
/// Creates `dest_dir` and any intermediate directories as needed. Fails
/// with `CorruptArchive` when the blob is not a well-formed archive, which
/// includes any blob produced by [`pack_flat`].
pub fn unpack(blob: &[u8], dest_dir: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(blob)).map_err(|e| {
        SafeboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::CorruptArchive,
            "decrypted data is not a well-formed archive",
            e,
        )
    })?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| io_error(format!("failed to create {}", dest_dir.display()), e))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::CorruptArchive,
                "archive entry is corrupt",
                e,
            )
        })?;
        if entry.is_dir() {
            continue;
        }
        // Reject entry names that would escape dest_dir (absolute paths
        // or ".." components).
        let rel = entry.enclosed_name().ok_or_else(|| {
            SafeboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::CorruptArchive,
                format!("archive entry has an unsafe path: {}", entry.name()),
            )
        })?;
        let out_path = dest_dir.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| io_error(format!("failed to create {}", parent.display()), e))?;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(|e| {
            SafeboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::CorruptArchive,
                format!("failed to inflate archive entry {}", entry.name()),
                e,
            )
        })?;
        fs::write(&out_path, contents)
            .map_err(|e| io_error(format!("failed to write {}", out_path.display()), e))?;
    }

    Ok(())
}
