//! Overwrite confirmation
//!
//! The orchestrator never writes over an existing container without asking.
//! The question itself is UI, so it lives behind a trait: the binary plugs
//! in an interactive prompt, tests and `--force` plug in a constant answer.

use crate::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use std::io::{self, IsTerminal};
use std::path::Path;

/// Decides whether an existing file at `path` may be overwritten.
pub trait OverwriteConfirmer {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool>;
}

/// Always answers the same way (for tests and `--force`).
pub struct ConstantConfirmer(pub bool);

impl OverwriteConfirmer for ConstantConfirmer {
    fn confirm_overwrite(&mut self, _path: &Path) -> Result<bool> {
        Ok(self.0)
    }
}

/// Asks a yes/no question on the terminal, defaulting to no.
///
/// When stdin is not a terminal there is nobody to ask, so the answer is
/// a safe "no" rather than an error.
pub struct TerminalConfirmer;

impl OverwriteConfirmer for TerminalConfirmer {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool> {
        if !io::stdin().is_terminal() {
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()
            .map_err(|e| {
                SafeboxError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to read confirmation: {}", e),
                )
            })
    }
}
