//! Password to key/IV derivation
//!
//! Implements OpenSSL's classic `EVP_BytesToKey` construction over SHA-256:
//!
//! ```text
//! D_1 = H(password || salt)
//! D_i = H(D_{i-1} || password || salt)
//! ```
//!
//! The digests are concatenated until `KEY_LEN + IV_LEN` bytes exist. The
//! first `KEY_LEN` bytes form the AES key, the next `IV_LEN` bytes the IV.
//!
//! Files are derived with a single iteration. This is weak against brute
//! force on poor passwords but is part of the file format: changing it makes
//! every existing file undecryptable.

use crate::error::{CryptError, ErrorCategory, ErrorKind, Result};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of salt in bytes
pub const SALT_LEN: usize = 8;

/// Length of the AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the CBC initialization vector in bytes
pub const IV_LEN: usize = 16;

/// `EVP_BytesToKey` iteration count used by the file format
pub const KDF_ITERATIONS: u32 = 1;

/// Random salt stored at the start of every encrypted file.
pub type Salt = [u8; SALT_LEN];

/// Key and IV for one file operation. Wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl DerivedKeyMaterial {
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

/// Derive the key and IV for `salt` and `password` as stored files expect.
pub fn derive(password: &[u8], salt: &Salt) -> Result<DerivedKeyMaterial> {
    derive_with_iterations(password, salt, KDF_ITERATIONS)
}

/// Derive key and IV using an explicit `EVP_BytesToKey` iteration count.
///
/// Each digest `D_i` is re-hashed `iterations - 1` additional times before
/// being appended. Files written by this crate always use
/// [`KDF_ITERATIONS`]; other counts exist for interoperating with tools that
/// expose the parameter.
pub fn derive_with_iterations(
    password: &[u8],
    salt: &Salt,
    iterations: u32,
) -> Result<DerivedKeyMaterial> {
    if iterations == 0 {
        return Err(CryptError::new(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            "key derivation requires at least one iteration",
        ));
    }

    let mut material = Zeroizing::new(Vec::with_capacity(KEY_LEN + IV_LEN + 32));
    let mut previous = Zeroizing::new(Vec::new());

    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Sha256::new();
        hasher.update(&previous[..]);
        hasher.update(password);
        hasher.update(salt);
        let mut digest = hasher.finalize();
        for _ in 1..iterations {
            digest = Sha256::digest(digest.as_slice());
        }

        material.extend_from_slice(&digest);
        previous.clear();
        previous.extend_from_slice(&digest);
        digest.as_mut_slice().zeroize();
    }

    let mut derived = DerivedKeyMaterial {
        key: [0u8; KEY_LEN],
        iv: [0u8; IV_LEN],
    };
    derived.key.copy_from_slice(&material[..KEY_LEN]);
    derived
        .iv
        .copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    Ok(derived)
}
