//! File encryption/decryption operations
//!
//! Opens the input and output files and streams one through the other
//! using the salted AES-256-CBC format from [`crate::crypt`].
//!
//! Neither operation rolls back on failure: a partially written output file
//! is left in place and must be treated as untrustworthy by the caller.

use crate::crypt;
use crate::error::{CryptError, ErrorCategory, ErrorKind, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path` and writes the salt followed by the
/// ciphertext to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(input_path: &Path, output_path: &Path, password: &[u8]) -> Result<()> {
    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        "encrypting file"
    );
    let input = open_input(input_path)?;
    let output = create_output(output_path)?;

    let written = crypt::encrypt(password, BufReader::new(input), BufWriter::new(output))
        .map_err(|e| e.with_context(format!("failed to encrypt {}", input_path.display())))?;

    tracing::debug!(written, "encryption complete");
    Ok(())
}

/// Decrypt a file with a password
///
/// Reads the salt and ciphertext from `input_path` and writes the plaintext
/// to `output_path`. On a padding failure, plaintext for all blocks before
/// the last one has already been written.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(input_path: &Path, output_path: &Path, password: &[u8]) -> Result<()> {
    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        "decrypting file"
    );
    let input = open_input(input_path)?;
    let output = create_output(output_path)?;

    let written = crypt::decrypt(password, BufReader::new(input), BufWriter::new(output))
        .map_err(|e| e.with_context(format!("failed to decrypt {}", input_path.display())))?;

    tracing::debug!(written, "decryption complete");
    Ok(())
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| open_error(path, e))
}

/// Create or truncate the output file with secure permissions (0o600 on Unix)
fn create_output(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path).map_err(|e| open_error(path, e))
}

fn open_error(path: &Path, err: io::Error) -> CryptError {
    let category = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ErrorCategory::User,
        _ => ErrorCategory::Internal,
    };
    CryptError::with_source(
        category,
        ErrorKind::Io,
        format!("failed to open {}", path.display()),
        err,
    )
}
