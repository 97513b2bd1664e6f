//! Salted AES-256-CBC encryption over readers and writers
//!
//! The encrypted format is:
//! - salt: 8 bytes
//! - ciphertext: AES-256-CBC with PKCS#7 padding, a multiple of 16 bytes
//!
//! Key and IV come from [`kdf::derive`] over the password and salt. The
//! ciphertext is identical to what `openssl enc -aes-256-cbc -md sha256`
//! produces for the same salt and password.

use crate::error::{CryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, SALT_LEN, Salt};
use crate::stream::{BLOCK_LEN, CipherContext, Direction, StreamCodec};
use rand::RngCore;
use rand::rngs::OsRng;
use std::io::{self, Read, Write};

/// Size of the encrypted output for a plaintext of `plaintext_len` bytes.
pub fn encrypted_len(plaintext_len: u64) -> u64 {
    SALT_LEN as u64 + (plaintext_len / BLOCK_LEN as u64 + 1) * BLOCK_LEN as u64
}

/// Draw a fresh salt from the operating system RNG.
pub fn generate_salt() -> Result<Salt> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt).map_err(|e| {
        CryptError::with_source(
            ErrorCategory::Internal,
            ErrorKind::RandomSource,
            "failed to generate salt",
            e,
        )
    })?;
    Ok(salt)
}

/// Encrypt everything in `source` to `destination` under a random salt.
///
/// Returns the number of bytes written, salt included.
pub fn encrypt<R: Read, W: Write>(password: &[u8], source: R, destination: W) -> Result<u64> {
    encrypt_with_codec(password, source, destination, StreamCodec::default())
}

/// Like [`encrypt`], reading the source in chunks sized by `codec`.
pub fn encrypt_with_codec<R: Read, W: Write>(
    password: &[u8],
    source: R,
    destination: W,
    codec: StreamCodec,
) -> Result<u64> {
    let salt = generate_salt()?;
    tracing::debug!("generated salt");
    encrypt_with_salt(password, &salt, source, destination, codec)
}

/// Encrypt using a caller-provided salt.
///
/// Reusing a salt with the same password yields identical ciphertext for
/// identical plaintext. Outside of tests, use [`encrypt`], which draws a
/// fresh salt per call.
pub fn encrypt_with_salt<R: Read, W: Write>(
    password: &[u8],
    salt: &Salt,
    source: R,
    mut destination: W,
    codec: StreamCodec,
) -> Result<u64> {
    destination
        .write_all(salt)
        .map_err(|e| io_error("failed to write salt", e))?;

    let material = kdf::derive(password, salt)?;
    let context = CipherContext::new(Direction::Encrypt, &material)?;
    drop(material);

    let written = codec.transform(context, source, destination)?;
    Ok(SALT_LEN as u64 + written)
}

/// Read the salt prefix of an encrypted stream.
pub fn read_salt<R: Read>(source: &mut R) -> Result<Salt> {
    let mut salt = [0u8; SALT_LEN];
    source.read_exact(&mut salt).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CryptError::with_source(
                ErrorCategory::User,
                ErrorKind::TruncatedInput,
                "input likely truncated while reading salt",
                e,
            )
        } else {
            io_error("failed to read salt", e)
        }
    })?;
    Ok(salt)
}

/// Decrypt an encrypted stream from `source` into `destination`.
///
/// A wrong password is only detected through invalid padding in the final
/// block, which fails with [`ErrorKind::PaddingValidation`]. Plaintext for
/// earlier blocks has already been written by then.
///
/// Returns the number of plaintext bytes written.
pub fn decrypt<R: Read, W: Write>(password: &[u8], source: R, destination: W) -> Result<u64> {
    decrypt_with_codec(password, source, destination, StreamCodec::default())
}

/// Like [`decrypt`], reading the source in chunks sized by `codec`.
pub fn decrypt_with_codec<R: Read, W: Write>(
    password: &[u8],
    mut source: R,
    destination: W,
    codec: StreamCodec,
) -> Result<u64> {
    let salt = read_salt(&mut source)?;

    let material = kdf::derive(password, &salt)?;
    let context = CipherContext::new(Direction::Decrypt, &material)?;
    drop(material);

    codec.transform(context, source, destination)
}

fn io_error(msg: &str, err: io::Error) -> CryptError {
    CryptError::with_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}
