//! Chunked AES-256-CBC transform shared by encryption and decryption
//!
//! [`CipherContext`] behaves like an OpenSSL `EVP_CIPHER_CTX`: `update`
//! accepts input of any length and emits whole blocks, buffering the rest,
//! and `finalize` pads (encrypt) or validates and strips padding (decrypt).
//! [`StreamCodec`] drives a context from a reader to a writer.

use crate::error::{CryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::DerivedKeyMaterial;
use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, BlockSizeUser, KeyIvInit};
use block_padding::{Padding, Pkcs7};
use std::io::{self, Read, Write};
use zeroize::Zeroizing;

/// AES block size in bytes
pub const BLOCK_LEN: usize = 16;

/// Default number of input bytes fed to the cipher per update
pub const CHUNK_LEN: usize = 1024;

type AesBlockSize = <Aes256 as BlockSizeUser>::BlockSize;

/// Which way a [`CipherContext`] runs the cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

enum Mode {
    Encrypt(cbc::Encryptor<Aes256>),
    Decrypt(cbc::Decryptor<Aes256>),
}

/// AES-256-CBC context with PKCS#7 padding.
pub struct CipherContext {
    mode: Mode,
    // Bytes not yet run through the cipher. Encryption keeps fewer than
    // BLOCK_LEN here; decryption always keeps the newest full block back
    // for finalize.
    pending: Zeroizing<Vec<u8>>,
}

impl CipherContext {
    /// Set up the cipher for `direction` with the derived key and IV.
    pub fn new(direction: Direction, material: &DerivedKeyMaterial) -> Result<Self> {
        let mode = match direction {
            Direction::Encrypt => {
                cbc::Encryptor::<Aes256>::new_from_slices(material.key(), material.iv())
                    .map(Mode::Encrypt)
            }
            Direction::Decrypt => {
                cbc::Decryptor::<Aes256>::new_from_slices(material.key(), material.iv())
                    .map(Mode::Decrypt)
            }
        }
        .map_err(|e| {
            CryptError::new(
                ErrorCategory::Internal,
                ErrorKind::CipherInit,
                format!("failed to initialize AES-256-CBC: {}", e),
            )
        })?;

        Ok(Self {
            mode,
            pending: Zeroizing::new(Vec::with_capacity(CHUNK_LEN + BLOCK_LEN)),
        })
    }

    /// Direction this context was created for.
    pub fn direction(&self) -> Direction {
        match self.mode {
            Mode::Encrypt(_) => Direction::Encrypt,
            Mode::Decrypt(_) => Direction::Decrypt,
        }
    }

    /// Feed `input` through the cipher, appending whatever output is ready.
    ///
    /// At most `input.len() + BLOCK_LEN` bytes are appended per call.
    pub fn update(&mut self, input: &[u8], output: &mut Vec<u8>) {
        self.buffer(input);

        let ready = match self.mode {
            Mode::Encrypt(_) => self.pending.len() / BLOCK_LEN * BLOCK_LEN,
            Mode::Decrypt(_) => self.pending.len().saturating_sub(1) / BLOCK_LEN * BLOCK_LEN,
        };
        if ready == 0 {
            return;
        }

        output.reserve(ready);
        for chunk in self.pending[..ready].chunks_exact(BLOCK_LEN) {
            let mut block = aes::Block::clone_from_slice(chunk);
            match &mut self.mode {
                Mode::Encrypt(enc) => enc.encrypt_block_mut(&mut block),
                Mode::Decrypt(dec) => dec.decrypt_block_mut(&mut block),
            }
            output.extend_from_slice(&block);
        }
        self.pending.drain(..ready);
    }

    fn buffer(&mut self, input: &[u8]) {
        let needed = self.pending.len() + input.len();
        if needed > self.pending.capacity() {
            // Move into a fresh allocation; dropping the old one wipes it.
            let mut grown = Zeroizing::new(Vec::with_capacity(needed + BLOCK_LEN));
            grown.extend_from_slice(&self.pending);
            self.pending = grown;
        }
        self.pending.extend_from_slice(input);
    }

    /// Flush the last block.
    ///
    /// Encryption pads the buffered tail to a full block. Decryption
    /// requires exactly one buffered block whose padding is valid, and
    /// appends it with the padding removed.
    pub fn finalize(mut self, output: &mut Vec<u8>) -> Result<()> {
        let pending_len = self.pending.len();
        match &mut self.mode {
            Mode::Encrypt(enc) => {
                let mut block = aes::Block::default();
                block[..pending_len].copy_from_slice(&self.pending);
                <Pkcs7 as Padding<AesBlockSize>>::pad(&mut block, pending_len);
                enc.encrypt_block_mut(&mut block);
                output.extend_from_slice(&block);
                Ok(())
            }
            Mode::Decrypt(dec) => {
                if pending_len != BLOCK_LEN {
                    return Err(padding_error(format!(
                        "decryption failed: final block has {} of {} bytes",
                        pending_len, BLOCK_LEN
                    )));
                }
                let mut block = aes::Block::clone_from_slice(&self.pending);
                dec.decrypt_block_mut(&mut block);
                let result = match <Pkcs7 as Padding<AesBlockSize>>::unpad(&block) {
                    Ok(plaintext) => {
                        output.extend_from_slice(plaintext);
                        Ok(())
                    }
                    Err(_) => Err(padding_error("decryption failed: invalid padding")),
                };
                block.as_mut_slice().fill(0);
                result
            }
        }
    }
}

fn padding_error(msg: impl Into<String>) -> CryptError {
    CryptError::new(ErrorCategory::User, ErrorKind::PaddingValidation, msg)
}

/// Read/update/write loop around a [`CipherContext`].
#[derive(Debug, Clone, Copy)]
pub struct StreamCodec {
    chunk_len: usize,
}

impl Default for StreamCodec {
    fn default() -> Self {
        Self {
            chunk_len: CHUNK_LEN,
        }
    }
}

impl StreamCodec {
    /// Codec reading `chunk_len` bytes per update. A length of 0 is raised to 1.
    pub fn with_chunk_len(chunk_len: usize) -> Self {
        Self {
            chunk_len: chunk_len.max(1),
        }
    }

    /// Number of input bytes read per update.
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Run all of `source` through `context` into `destination`.
    ///
    /// Output is written as soon as the cipher produces it, so a failure
    /// leaves everything before the failing block in `destination`.
    /// Returns the number of bytes written.
    pub fn transform<R, W>(
        &self,
        mut context: CipherContext,
        mut source: R,
        mut destination: W,
    ) -> Result<u64>
    where
        R: Read,
        W: Write,
    {
        let direction = context.direction();
        let mut input = Zeroizing::new(vec![0u8; self.chunk_len]);
        let mut output = Zeroizing::new(Vec::with_capacity(self.chunk_len + BLOCK_LEN));
        let mut written: u64 = 0;

        loop {
            let n = match source.read(&mut input) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error("failed to read input", e)),
            };

            output.clear();
            context.update(&input[..n], &mut output);
            destination
                .write_all(&output)
                .map_err(|e| io_error("failed to write output", e))?;
            written += output.len() as u64;
        }

        output.clear();
        if let Err(e) = context.finalize(&mut output) {
            tracing::warn!(?direction, written, "final block rejected");
            return Err(e);
        }
        destination
            .write_all(&output)
            .map_err(|e| io_error("failed to write output", e))?;
        destination
            .flush()
            .map_err(|e| io_error("failed to flush output", e))?;
        written += output.len() as u64;

        tracing::debug!(?direction, written, "stream finished");
        Ok(written)
    }
}

fn io_error(msg: &str, err: io::Error) -> CryptError {
    CryptError::with_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}
