//! Password-based key derivation
//!
//! PBKDF2-HMAC-SHA256 turns a password and a random salt into a 256-bit
//! AES key. The iteration count is part of the file format: changing it
//! makes existing files undecryptable, so it is a constant rather than a
//! setting.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::trace;
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte key from a password and salt.
///
/// The key is wiped from memory when the returned value is dropped. Any
/// password, including the empty one, is accepted here.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    trace!(iterations = PBKDF2_ITERATIONS, "deriving key");
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let salt = [42u8; SALT_LEN];
        let k1 = derive_key(b"password", &salt);
        let k2 = derive_key(b"password", &salt);
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_salt_separates_keys() {
        let k1 = derive_key(b"password", &[1u8; SALT_LEN]);
        let k2 = derive_key(b"password", &[2u8; SALT_LEN]);
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_password_separates_keys() {
        let salt = [7u8; SALT_LEN];
        let k1 = derive_key(b"pw123", &salt);
        let k2 = derive_key(b"pw124", &salt);
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_known_key() {
        // Reference value from an independent PBKDF2-HMAC-SHA256 implementation.
        #[rustfmt::skip]
        let expected: [u8; KEY_LEN] = [
            0xd1, 0xf1, 0xf6, 0x0f, 0xdc, 0x54, 0xd0, 0x9b,
            0x6c, 0x2d, 0x7b, 0x90, 0xa3, 0xd2, 0x54, 0x1c,
            0x1d, 0x2a, 0xcc, 0x67, 0xa9, 0x48, 0x09, 0x21,
            0x44, 0x85, 0x1d, 0x19, 0x6f, 0xc4, 0x76, 0x49,
        ];
        let key = derive_key(b"pw123", &[0x42u8; SALT_LEN]);
        assert_eq!(*key, expected);
    }

    #[test]
    fn test_empty_password_accepted() {
        #[rustfmt::skip]
        let expected: [u8; KEY_LEN] = [
            0x6e, 0xe8, 0x6f, 0xeb, 0xb0, 0x65, 0x31, 0xc5,
            0xd2, 0xa4, 0xb2, 0xc8, 0x3d, 0x34, 0xea, 0x22,
            0x36, 0x42, 0x98, 0xc1, 0x85, 0x65, 0x6f, 0xdd,
            0x12, 0x15, 0x02, 0x76, 0x74, 0x3e, 0x0d, 0x4d,
        ];
        let key = derive_key(b"", &[0u8; SALT_LEN]);
        assert_eq!(*key, expected);
    }
}
