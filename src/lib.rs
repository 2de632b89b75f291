//! pwbox - Password-based file encryption using AES-256-CBC and PBKDF2
//!
//! Files are stored as `salt (16) ‖ iv (16) ‖ ciphertext`, where the key is
//! derived from the password with PBKDF2-HMAC-SHA256 and the ciphertext is
//! the PKCS#7-padded plaintext encrypted with AES-256-CBC.

#![forbid(unsafe_code)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod password;
