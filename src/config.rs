//! Encryption policy

/// Default cap on plaintext size: 1 MiB.
pub const DEFAULT_MAX_PLAINTEXT_LEN: u64 = 1024 * 1024;

/// Settings that may vary between deployments without affecting the
/// container format.
///
/// Built once by the caller and passed into [`crate::file_ops::encrypt_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Largest plaintext, in bytes, that encryption accepts. Decryption does
    /// not consult this.
    pub max_plaintext_len: u64,
}

impl Policy {
    pub fn new(max_plaintext_len: u64) -> Self {
        Self { max_plaintext_len }
    }

    /// Whether a plaintext of `len` bytes is within the cap.
    pub fn allows(&self, len: u64) -> bool {
        len <= self.max_plaintext_len
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAINTEXT_LEN)
    }
}
