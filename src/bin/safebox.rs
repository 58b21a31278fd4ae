//! Safebox CLI - passphrase-based directory encryption
//!
//! Two ways in: subcommands for scripting (`safebox encrypt`, `safebox
//! decrypt`), or an interactive flow when invoked with no subcommand
//! (banner, prompts, colored output). The core pipeline lives in the
//! library; this binary only gathers input and presents results.

use clap::{Parser, Subcommand};
use owo_colors::{OwoColorize, Stream::Stderr, Stream::Stdout};
use std::path::{Path, PathBuf};
use std::process;

use safebox::confirm::{ConstantConfirmer, OverwriteConfirmer, TerminalConfirmer};
use safebox::error::{ErrorCategory, ErrorKind, Result, SafeboxError};
use safebox::ops::{self, EncryptOutcome, PackMode, ProgressSink};
use safebox::params::CryptoParams;
use safebox::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "safebox")]
#[command(version)]
#[command(about = "Passphrase-based directory encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a directory into a single container file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the directory to encrypt
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Path to the container file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Concatenate file contents instead of archiving. LOSSY: file
        /// names and directory structure are not preserved and the result
        /// cannot be restored as individual files.
        #[arg(long)]
        no_archive: bool,

        /// Overwrite an existing output file without asking
        #[arg(long)]
        force: bool,
    },

    /// Decrypt a container file into a directory
    #[command(alias = "d")]
    Decrypt {
        /// Path to the container file to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the directory to extract into (created if absent)
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
}

/// Announces pipeline stages on stderr.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn stage(&mut self, stage: &str) {
        let label = match stage {
            "packing" => "Packing folder...",
            "encrypting" => "Encrypting...",
            "writing" => "Writing container...",
            "decrypting" => "Decrypting...",
            "extracting" => "Extracting archive...",
            other => other,
        };
        eprintln!("{}", label.if_supports_color(Stderr, |t| t.cyan()));
    }
}

fn main() {
    let cli = Cli::parse();
    let mut passphrase_reader = get_passphrase_reader(cli.passphrase_stdin);

    let result = match cli.command {
        Some(Commands::Encrypt {
            input,
            output,
            no_archive,
            force,
        }) => {
            let mode = if no_archive {
                PackMode::Flat
            } else {
                PackMode::Archive
            };
            let mut confirmer: Box<dyn OverwriteConfirmer> = if force {
                Box::new(ConstantConfirmer(true))
            } else {
                Box::new(TerminalConfirmer)
            };
            run_encrypt(&input, &output, mode, &mut *passphrase_reader, &mut *confirmer)
        }
        Some(Commands::Decrypt { input, output }) => {
            run_decrypt(&input, &output, &mut *passphrase_reader)
        }
        None => run_interactive(&mut *passphrase_reader),
    };

    if let Err(e) = result {
        eprint!(
            "{} {}",
            "Error:".if_supports_color(Stderr, |t| t.red()),
            e
        );
        let mut source: Option<&dyn std::error::Error> =
            e.source_error().map(|s| s as &dyn std::error::Error);
        while let Some(cause) = source {
            eprint!(": {}", cause);
            source = cause.source();
        }
        eprintln!();
        process::exit(1);
    }
}

fn run_encrypt(
    source: &Path,
    output: &Path,
    mode: PackMode,
    passphrase_reader: &mut dyn PassphraseReader,
    confirmer: &mut dyn OverwriteConfirmer,
) -> Result<()> {
    if mode == PackMode::Flat {
        eprintln!(
            "{}",
            "Warning: flat mode does not preserve file names or structure; \
             the result cannot be restored as individual files."
                .if_supports_color(Stderr, |t| t.yellow())
        );
    }

    let outcome = ops::encrypt_dir(
        source,
        output,
        mode,
        &CryptoParams::default(),
        passphrase_reader,
        confirmer,
        &mut ConsoleProgress,
    )?;

    match outcome {
        EncryptOutcome::Written => println!(
            "{} {}",
            "Encrypted:".if_supports_color(Stdout, |t| t.green()),
            output.display()
        ),
        EncryptOutcome::Aborted => println!("Aborted; {} left untouched.", output.display()),
    }
    Ok(())
}

fn run_decrypt(
    input: &Path,
    dest: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    ops::decrypt_file(
        input,
        dest,
        &CryptoParams::default(),
        passphrase_reader,
        &mut ConsoleProgress,
    )?;
    println!(
        "{} {}",
        "Decrypted into:".if_supports_color(Stdout, |t| t.green()),
        dest.display()
    );
    Ok(())
}

/// The original-tool style flow: banner, then prompt for everything.
fn run_interactive(passphrase_reader: &mut dyn PassphraseReader) -> Result<()> {
    print_banner();

    let action = dialoguer::Select::new()
        .with_prompt("Action")
        .items(&["Encrypt a folder", "Decrypt a container"])
        .default(0)
        .interact()
        .map_err(prompt_error)?;

    if action == 0 {
        let source: String = dialoguer::Input::new()
            .with_prompt("Source folder")
            .interact_text()
            .map_err(prompt_error)?;
        let destination: String = dialoguer::Input::new()
            .with_prompt("Destination file")
            .interact_text()
            .map_err(prompt_error)?;
        // Container files get a .bin extension, matching what decrypt
        // users will expect to find.
        let destination = if destination.ends_with(".bin") {
            destination
        } else {
            format!("{destination}.bin")
        };
        let compress = dialoguer::Confirm::new()
            .with_prompt("Archive the folder before encrypting? (answering no is lossy)")
            .default(true)
            .interact()
            .map_err(prompt_error)?;
        let mode = if compress {
            PackMode::Archive
        } else {
            PackMode::Flat
        };
        run_encrypt(
            &PathBuf::from(source),
            &PathBuf::from(destination),
            mode,
            passphrase_reader,
            &mut TerminalConfirmer,
        )
    } else {
        let source: String = dialoguer::Input::new()
            .with_prompt("Container file")
            .interact_text()
            .map_err(prompt_error)?;
        let destination: String = dialoguer::Input::new()
            .with_prompt("Destination folder")
            .interact_text()
            .map_err(prompt_error)?;
        run_decrypt(
            &PathBuf::from(source),
            &PathBuf::from(destination),
            passphrase_reader,
        )
    }
}

fn print_banner() {
    let banner = r#"
             __      _
   ___ __ _ / _| ___| |__   _____  __
  / __/ _` | |_ / _ \ '_ \ / _ \ \/ /
  \__ \ (_| |  _|  __/ |_) | (_) >  <
  |___/\__,_|_|  \___|_.__/ \___/_/\_\
"#;
    eprintln!("{}", banner.if_supports_color(Stderr, |t| t.cyan()));
}

fn prompt_error(e: dialoguer::Error) -> SafeboxError {
    SafeboxError::with_kind(
        ErrorCategory::Internal,
        ErrorKind::Io,
        format!("failed to read input: {}", e),
    )
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
