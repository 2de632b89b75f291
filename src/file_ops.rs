//! File encryption/decryption operations
//!
//! This module provides the file-level operations on top of [`envelope`]:
//! input validation, the plaintext size policy and atomic output writes.

use crate::config::Policy;
use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, PwboxError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Byte counts of a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Length of the file that was read.
    pub input_len: u64,
    /// Length of the file that was written.
    pub output_len: u64,
}

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it and writes the container
/// (salt ‖ IV ‖ ciphertext) to `output_path`, replacing any existing file.
///
/// Fails with [`ErrorKind::NotFound`] if the input is not a regular file and
/// with [`ErrorKind::SizeExceeded`] if it is larger than the policy allows;
/// the size is checked before the file is read.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    password: &[u8],
    policy: &Policy,
) -> Result<Summary> {
    let claimed_len = regular_file_len(input_path)?;
    check_size(input_path, claimed_len, policy)?;

    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    // The file may have grown since it was stat'ed.
    check_size(input_path, plaintext.len() as u64, policy)?;
    debug!(path = %input_path.display(), bytes = plaintext.len(), "read plaintext");

    let ciphertext = envelope::encrypt(password, &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_atomic(output_path, &ciphertext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "encrypted file"
    );

    Ok(Summary {
        input_len: plaintext.len() as u64,
        output_len: ciphertext.len() as u64,
    })
}

/// Decrypt a file with a password
///
/// Reads a container from `input_path`, decrypts it and writes the plaintext
/// to `output_path`, replacing any existing file. Nothing is written unless
/// decryption succeeds.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(input_path: &Path, output_path: &Path, password: &[u8]) -> Result<Summary> {
    regular_file_len(input_path)?;
    let container = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    debug!(path = %input_path.display(), bytes = container.len(), "read container");

    let plaintext = envelope::decrypt(password, &container)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_atomic(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "decrypted file"
    );

    Ok(Summary {
        input_len: container.len() as u64,
        output_len: plaintext.len() as u64,
    })
}

/// Returns the length of the regular file at `path`.
fn regular_file_len(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| read_error(path, e))?;
    if !metadata.is_file() {
        return Err(PwboxError::new(
            ErrorCategory::User,
            ErrorKind::NotFound,
            format!("{} is not a regular file", path.display()),
        ));
    }
    Ok(metadata.len())
}

fn check_size(path: &Path, len: u64, policy: &Policy) -> Result<()> {
    if policy.allows(len) {
        return Ok(());
    }
    Err(PwboxError::new(
        ErrorCategory::User,
        ErrorKind::SizeExceeded,
        format!(
            "{} is {} bytes, exceeding the maximum of {} bytes",
            path.display(),
            len,
            policy.max_plaintext_len
        ),
    ))
}

/// Write `contents` to `path` atomically (tempfile + fsync + rename).
///
/// Either the previous file or the complete new one exists afterwards,
/// never a partial one.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| io_error(ErrorCategory::User, "failed to create tempfile", e))?;

    temp_file
        .write_all(contents)
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to flush tempfile", e))?;
    temp_file.as_file().sync_all().map_err(|e| {
        io_error(
            ErrorCategory::Internal,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| io_error(ErrorCategory::Internal, "failed to get tempfile metadata", e))?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            io_error(
                ErrorCategory::Internal,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        PwboxError::with_source(
            ErrorCategory::Internal,
            ErrorKind::OperationFailed,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn io_error(category: ErrorCategory, msg: &str, err: io::Error) -> PwboxError {
    PwboxError::with_source(category, ErrorKind::OperationFailed, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> PwboxError {
    let (category, kind) = if err.kind() == io::ErrorKind::NotFound {
        (ErrorCategory::User, ErrorKind::NotFound)
    } else {
        (ErrorCategory::Internal, ErrorKind::OperationFailed)
    };
    PwboxError::with_source(
        category,
        kind,
        format!("failed to read from {}", path.display()),
        err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_PLAINTEXT_LEN;
    use crate::envelope::{HEADER_LEN, IV_LEN};
    use crate::kdf::SALT_LEN;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.enc");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        let plaintext = b"Hello, pwbox!";
        fs::write(&plain_path, plaintext).unwrap();

        let summary =
            encrypt_file(&plain_path, &crypt_path, b"test password", &Policy::default()).unwrap();
        assert_eq!(summary.input_len, plaintext.len() as u64);
        assert_eq!(summary.output_len, fs::metadata(&crypt_path).unwrap().len());

        let summary = decrypt_file(&crypt_path, &decrypted_path, b"test password").unwrap();
        assert_eq!(summary.output_len, plaintext.len() as u64);
        assert_eq!(fs::read(&decrypted_path).unwrap(), plaintext);
    }

    #[test]
    fn test_hello_world_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("hello.txt");
        let crypt_path = temp_dir.path().join("hello.txt.enc");

        fs::write(&plain_path, b"hello world").unwrap();
        let summary = encrypt_file(&plain_path, &crypt_path, b"pw123", &Policy::default()).unwrap();

        assert_eq!(summary.input_len, 11);
        assert_eq!(summary.output_len, 48);
        assert_eq!(fs::metadata(&crypt_path).unwrap().len(), 48);
    }

    #[test]
    fn test_decrypt_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let crypt_path = temp_dir.path().join("secret.enc");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        // Fixed salt/IV known not to yield valid padding under "wrong".
        let container = envelope::encrypt_deterministic(
            b"correct",
            b"secret",
            &[5u8; SALT_LEN],
            &[6u8; IV_LEN],
        )
        .unwrap();
        fs::write(&crypt_path, &container).unwrap();

        let err = decrypt_file(&crypt_path, &decrypted_path, b"wrong").expect_err("expected failure");
        assert_eq!(err.kind, ErrorKind::InvalidPasswordOrCorrupt);
        assert!(!decrypted_path.exists());

        decrypt_file(&crypt_path, &decrypted_path, b"correct").unwrap();
        assert_eq!(fs::read(&decrypted_path).unwrap(), b"secret");
    }

    #[test]
    fn test_failed_decrypt_keeps_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let crypt_path = temp_dir.path().join("short.enc");
        let output_path = temp_dir.path().join("existing.txt");

        fs::write(&crypt_path, [0u8; 10]).unwrap();
        fs::write(&output_path, b"keep me").unwrap();

        let err = decrypt_file(&crypt_path, &output_path, b"pw").expect_err("expected corrupt");
        assert_eq!(err.kind, ErrorKind::Corrupt);
        assert_eq!(fs::read(&output_path).unwrap(), b"keep me");
    }

    #[test]
    fn test_encrypt_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let output = temp_dir.path().join("out.enc");

        let err = encrypt_file(&missing, &output, b"pw", &Policy::default())
            .expect_err("expected not found");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.category, ErrorCategory::User);
        assert!(!output.exists());
    }

    #[test]
    fn test_decrypt_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.enc");
        let output = temp_dir.path().join("out.txt");

        let err = decrypt_file(&missing, &output, b"pw").expect_err("expected not found");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!output.exists());
    }

    #[test]
    fn test_directory_input_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.enc");

        let err = encrypt_file(temp_dir.path(), &output, b"pw", &Policy::default())
            .expect_err("expected not found");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_size_limit_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("max.bin");
        let crypt_path = temp_dir.path().join("max.bin.enc");

        let max = DEFAULT_MAX_PLAINTEXT_LEN as usize;
        fs::write(&plain_path, vec![0x42u8; max]).unwrap();
        let summary = encrypt_file(&plain_path, &crypt_path, b"pw", &Policy::default()).unwrap();
        assert_eq!(summary.output_len as usize, HEADER_LEN + max + 16);

        let over_path = temp_dir.path().join("over.bin");
        let over_crypt_path = temp_dir.path().join("over.bin.enc");
        fs::write(&over_path, vec![0x42u8; max + 1]).unwrap();
        let err = encrypt_file(&over_path, &over_crypt_path, b"pw", &Policy::default())
            .expect_err("expected size exceeded");
        assert_eq!(err.kind, ErrorKind::SizeExceeded);
        assert!(!over_crypt_path.exists());
    }

    #[test]
    fn test_custom_policy() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.enc");

        fs::write(&plain_path, b"0123456789").unwrap();

        let err = encrypt_file(&plain_path, &crypt_path, b"pw", &Policy::new(9))
            .expect_err("expected size exceeded");
        assert_eq!(err.kind, ErrorKind::SizeExceeded);

        encrypt_file(&plain_path, &crypt_path, b"pw", &Policy::new(10)).unwrap();
    }

    #[test]
    fn test_decrypt_ignores_policy_sized_containers() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.enc");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        let max = DEFAULT_MAX_PLAINTEXT_LEN as usize;
        fs::write(&plain_path, vec![7u8; max]).unwrap();
        encrypt_file(&plain_path, &crypt_path, b"pw", &Policy::default()).unwrap();

        // The container is larger than the cap; decryption does not care.
        decrypt_file(&crypt_path, &decrypted_path, b"pw").unwrap();
        assert_eq!(fs::read(&decrypted_path).unwrap().len(), max);
    }

    #[test]
    fn test_header_only_container() {
        let temp_dir = TempDir::new().unwrap();
        let crypt_path = temp_dir.path().join("header.enc");
        let output = temp_dir.path().join("out.txt");

        fs::write(&crypt_path, [0u8; HEADER_LEN]).unwrap();
        let err = decrypt_file(&crypt_path, &output, b"pw").expect_err("expected corrupt");
        assert_eq!(err.kind, ErrorKind::Corrupt);
        assert!(!output.exists());
    }

    #[test]
    fn test_overwrites_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.enc");

        fs::write(&plain_path, b"abc").unwrap();
        fs::write(&crypt_path, vec![0u8; 4096]).unwrap();

        encrypt_file(&plain_path, &crypt_path, b"pw", &Policy::default()).unwrap();
        assert_eq!(fs::metadata(&crypt_path).unwrap().len(), (HEADER_LEN + 16) as u64);
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.enc");

        fs::write(&plain_path, b"test").unwrap();
        encrypt_file(&plain_path, &crypt_path, b"test", &Policy::default()).unwrap();

        let metadata = fs::metadata(&crypt_path).unwrap();
        let permissions = metadata.permissions();
        assert_eq!(permissions.mode() & 0o777, 0o600);
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("empty.txt");
        let crypt_path = temp_dir.path().join("empty.txt.enc");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        fs::write(&plain_path, b"").unwrap();

        let summary = encrypt_file(&plain_path, &crypt_path, b"test", &Policy::default()).unwrap();
        assert_eq!(summary.output_len, (HEADER_LEN + 16) as u64);

        decrypt_file(&crypt_path, &decrypted_path, b"test").unwrap();
        assert_eq!(fs::read(&decrypted_path).unwrap(), b"");
    }
}
