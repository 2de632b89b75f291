//! Encryption/decryption using PBKDF2 + AES-256-CBC
//!
//! This module implements password-based encryption using:
//! - PBKDF2-HMAC-SHA256 for key derivation from the password
//! - AES-256 in CBC mode with PKCS#7 padding
//!
//! The binary format is:
//! - salt: 16 bytes
//! - iv: 16 bytes
//! - ciphertext: variable length, a non-zero multiple of 16 bytes
//!
//! There is no magic number, version or authentication tag. A wrong
//! password is only noticed when the padding fails to validate, which a
//! random key triggers with probability of roughly 255/256.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::{ErrorCategory, ErrorKind, PwboxError, Result};
use crate::kdf::{self, SALT_LEN};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Length of IV in bytes
pub const IV_LEN: usize = 16;

/// AES block length in bytes
pub const BLOCK_LEN: usize = 16;

/// Length of the salt + IV header preceding the ciphertext
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// Length of the padded plaintext (and so of the ciphertext) for a
/// plaintext of `plaintext_len` bytes. Padding always adds at least one
/// byte, so a block-aligned plaintext gains a whole block.
pub fn padded_len(plaintext_len: usize) -> usize {
    (plaintext_len / BLOCK_LEN + 1) * BLOCK_LEN
}

/// A parsed container borrowing its ciphertext from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container<'a> {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    /// Split `data` into salt, IV and ciphertext.
    ///
    /// Only structure is checked here; whether the ciphertext decrypts is
    /// decided by [`decrypt`].
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(corrupt(format!(
                "input likely truncated: {} bytes is shorter than the {}-byte salt and IV header",
                data.len(),
                HEADER_LEN
            )));
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (iv, ciphertext) = rest.split_at(IV_LEN);

        if ciphertext.is_empty() {
            return Err(corrupt("container holds no ciphertext"));
        }
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(corrupt(format!(
                "ciphertext length {} is not a multiple of the {}-byte block size",
                ciphertext.len(),
                BLOCK_LEN
            )));
        }

        Ok(Self {
            salt: salt.try_into().map_err(|e| internal("failed to read salt", e))?,
            iv: iv.try_into().map_err(|e| internal("failed to read iv", e))?,
            ciphertext,
        })
    }

    /// Serialize as salt ‖ IV ‖ ciphertext.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        output.extend_from_slice(&self.salt);
        output.extend_from_slice(&self.iv);
        output.extend_from_slice(self.ciphertext);
        output
    }
}

/// Encrypt plaintext with a password using random salt and IV
///
/// Returns the binary format: salt(16) + iv(16) + ciphertext(variable)
pub fn encrypt(password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| internal("failed to generate salt", e))?;

    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| internal("failed to generate iv", e))?;

    encrypt_deterministic(password, plaintext, &salt, &iv)
}

/// Encrypt plaintext with a password using provided salt and IV
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/IV.
pub fn encrypt_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>> {
    let key = kdf::derive_key(password, salt);

    let cipher = Aes256CbcEnc::new_from_slices(&key[..], iv).map_err(|_| {
        PwboxError::new(
            ErrorCategory::Internal,
            ErrorKind::OperationFailed,
            "failed to initialize cipher",
        )
    })?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "encrypted"
    );

    Ok(Container {
        salt: *salt,
        iv: *iv,
        ciphertext: &ciphertext,
    }
    .to_bytes())
}

/// Decrypt a container with a password
pub fn decrypt(password: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let container = Container::parse(data)?;

    let key = kdf::derive_key(password, &container.salt);
    let cipher = Aes256CbcDec::new_from_slices(&key[..], &container.iv).map_err(|_| {
        PwboxError::new(
            ErrorCategory::Internal,
            ErrorKind::OperationFailed,
            "failed to initialize cipher",
        )
    })?;

    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(container.ciphertext)
        .map_err(|_| {
            PwboxError::new(
                ErrorCategory::User,
                ErrorKind::InvalidPasswordOrCorrupt,
                "wrong password or corrupt input",
            )
        })?;
    debug!(plaintext_len = plaintext.len(), "decrypted");

    Ok(plaintext)
}

fn corrupt(msg: impl Into<String>) -> PwboxError {
    PwboxError::new(ErrorCategory::User, ErrorKind::Corrupt, msg)
}

fn internal(
    msg: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> PwboxError {
    PwboxError::with_source(
        ErrorCategory::Internal,
        ErrorKind::OperationFailed,
        msg,
        source,
    )
}
