//! Golden test vector validation
//!
//! Every vector in testdata/golden-vectors.json was produced by
//! `openssl enc -aes-256-cbc -md sha256 -S <salt> -pass pass:<passphrase>`
//! with the salt prepended, and the key/IV by the same command with `-P`.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use enctool::crypt;
use enctool::kdf::{self, SALT_LEN};
use enctool::stream::StreamCodec;
use serde::Deserialize;
use std::io::Cursor;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    passphrase: String,
    salt: String,
    key: String,
    iv: String,
    ciphertext: String,
    comment: String,
}

struct Decoded {
    plaintext: Vec<u8>,
    passphrase: Vec<u8>,
    salt: [u8; SALT_LEN],
    key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
}

fn load_golden_vectors() -> Vec<(GoldenVector, Decoded)> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    let vectors: Vec<GoldenVector> =
        serde_json::from_str(json_data).expect("failed to parse golden vectors");

    vectors
        .into_iter()
        .map(|v| {
            let decode = |field: &str| {
                BASE64_STANDARD
                    .decode(field)
                    .unwrap_or_else(|e| panic!("{}: bad base64: {}", v.comment, e))
            };
            let salt: [u8; SALT_LEN] = decode(v.salt.as_str())
                .try_into()
                .unwrap_or_else(|_| panic!("{}: salt must be {} bytes", v.comment, SALT_LEN));
            let decoded = Decoded {
                plaintext: decode(v.plaintext.as_str()),
                passphrase: decode(v.passphrase.as_str()),
                salt,
                key: decode(v.key.as_str()),
                iv: decode(v.iv.as_str()),
                ciphertext: decode(v.ciphertext.as_str()),
            };
            (v, decoded)
        })
        .collect()
}

#[test]
fn test_golden_key_derivation() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were tested");

    for (vector, d) in &vectors {
        let derived = kdf::derive(&d.passphrase, &d.salt).unwrap();
        assert_eq!(derived.key().to_vec(), d.key, "key: {}", vector.comment);
        assert_eq!(derived.iv().to_vec(), d.iv, "iv: {}", vector.comment);
    }
}

#[test]
fn test_golden_encryption() {
    for (vector, d) in load_golden_vectors() {
        let mut encrypted = Vec::new();
        crypt::encrypt_with_salt(
            &d.passphrase,
            &d.salt,
            Cursor::new(&d.plaintext),
            &mut encrypted,
            StreamCodec::default(),
        )
        .unwrap_or_else(|e| panic!("{}: encryption failed: {}", vector.comment, e));

        assert_eq!(
            encrypted, d.ciphertext,
            "ciphertext mismatch: {}",
            vector.comment
        );
        assert_eq!(
            encrypted.len() as u64,
            crypt::encrypted_len(d.plaintext.len() as u64),
            "length: {}",
            vector.comment
        );
    }
}

#[test]
fn test_golden_decryption() {
    for (vector, d) in load_golden_vectors() {
        for chunk_len in [1, 16, 1024] {
            let mut decrypted = Vec::new();
            crypt::decrypt_with_codec(
                &d.passphrase,
                Cursor::new(&d.ciphertext),
                &mut decrypted,
                StreamCodec::with_chunk_len(chunk_len),
            )
            .unwrap_or_else(|e| panic!("{}: decryption failed: {}", vector.comment, e));

            assert_eq!(
                decrypted, d.plaintext,
                "plaintext mismatch ({} byte chunks): {}",
                chunk_len, vector.comment
            );
        }
    }
}
