//! enctool - Password-based file encryption using AES-256-CBC
//!
//! Encrypted files consist of an 8-byte random salt followed by AES-256-CBC
//! ciphertext with PKCS#7 padding. Key and IV are derived from the password
//! and salt with OpenSSL's `EVP_BytesToKey` over SHA-256.
//!
//! There is no authentication tag: a wrong password or corrupted data is
//! only noticed when the final block fails padding validation.

#![forbid(unsafe_code)]

pub mod crypt;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod stream;

pub use error::{CryptError, ErrorCategory, ErrorKind, Result};
pub use file_ops::{decrypt_file, encrypt_file};
