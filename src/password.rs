//! Password sources for callers of the file operations

use crate::error::{ErrorCategory, ErrorKind, PwboxError, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passwords from various sources
pub trait PasswordReader {
    /// Read a password as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the password wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed password (command-line argument, tests)
pub struct ConstantPasswordReader {
    password: Zeroizing<Vec<u8>>,
}

impl ConstantPasswordReader {
    pub fn new(password: Vec<u8>) -> Self {
        Self {
            password: Zeroizing::new(password),
        }
    }
}

impl PasswordReader for ConstantPasswordReader {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.password).clone()))
    }
}

/// Reads the password from any io::Read source, verbatim to EOF
pub struct ReaderPasswordReader {
    reader: Box<dyn Read>,
}

impl ReaderPasswordReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PasswordReader for ReaderPasswordReader {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            PwboxError::with_source(
                ErrorCategory::Internal,
                ErrorKind::PasswordUnavailable,
                format!("error reading password: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads the password from the terminal with no echo
pub struct TerminalPasswordReader {
    prompt: String,
}

impl TerminalPasswordReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPasswordReader {
    fn default() -> Self {
        Self::new("Password: ")
    }
}

impl PasswordReader for TerminalPasswordReader {
    /// Read password from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passwords, use --password-stdin instead.
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(PwboxError::new(
                ErrorCategory::User,
                ErrorKind::PasswordUnavailable,
                "cannot read password from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                PwboxError::with_source(
                    ErrorCategory::Internal,
                    ErrorKind::PasswordUnavailable,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read password *without echo*
        let password = rpassword::read_password().map_err(|e| {
            PwboxError::with_source(
                ErrorCategory::Internal,
                ErrorKind::PasswordUnavailable,
                format!("failure reading password: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(password.into_bytes()))
    }
}

/// Wraps another PasswordReader and rejects an empty password
///
/// The codec itself accepts any password; refusing the empty one is a
/// policy of the interactive tool.
pub struct NonEmptyPasswordReader {
    upstream: Box<dyn PasswordReader>,
}

impl NonEmptyPasswordReader {
    pub fn new(upstream: Box<dyn PasswordReader>) -> Self {
        Self { upstream }
    }
}

impl PasswordReader for NonEmptyPasswordReader {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let password = self.upstream.read_password()?;
        if password.is_empty() {
            return Err(PwboxError::new(
                ErrorCategory::User,
                ErrorKind::EmptyPassword,
                "password must not be empty",
            ));
        }
        Ok(password)
    }
}
