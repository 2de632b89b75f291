//! pwbox CLI - Password-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-CBC with PBKDF2-HMAC-SHA256 key derivation.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::process;

use pwbox::config::{DEFAULT_MAX_PLAINTEXT_LEN, Policy};
use pwbox::error::{ErrorKind, PwboxError};
use pwbox::file_ops::{self, Summary};
use pwbox::password::{
    ConstantPasswordReader, NonEmptyPasswordReader, PasswordReader, ReaderPasswordReader,
    TerminalPasswordReader,
};

#[derive(Parser)]
#[command(name = "pwbox")]
#[command(version)]
#[command(about = "Password-based file encryption (AES-256-CBC).", long_about = None)]
struct Cli {
    /// Password to use (prompted for interactively when omitted)
    #[arg(short, long, global = true, conflicts_with = "password_stdin")]
    password: Option<String>,

    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    password_stdin: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        input: PathBuf,

        /// Path to the file to write the encrypted data to
        output: PathBuf,

        /// Largest input file, in bytes, that will be encrypted
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PLAINTEXT_LEN)]
        max_size: u64,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        input: PathBuf,

        /// Path to the file to write the decrypted data to
        output: PathBuf,
    },
}

impl Commands {
    fn mode(&self) -> &'static str {
        match self {
            Commands::Encrypt { .. } => "encrypt",
            Commands::Decrypt { .. } => "decrypt",
        }
    }

    fn paths(&self) -> (&Path, &Path) {
        match self {
            Commands::Encrypt { input, output, .. } | Commands::Decrypt { input, output } => {
                (input.as_path(), output.as_path())
            }
        }
    }
}

fn main() {
    let Cli {
        password,
        password_stdin,
        log_level,
        command,
    } = Cli::parse();
    init_logging(&log_level);

    let mut reader = get_password_reader(password, password_stdin, command.mode());
    let (input, output) = command.paths();

    let result = reader.read_password().and_then(|password| {
        print_banner(command.mode(), input, output);
        match &command {
            Commands::Encrypt { max_size, .. } => {
                file_ops::encrypt_file(input, output, &password, &Policy::new(*max_size))
            }
            Commands::Decrypt { .. } => file_ops::decrypt_file(input, output, &password),
        }
    });

    match result {
        Ok(summary) => {
            print_summary(&command, output, &summary);
            println!("\nOperation completed successfully.");
        }
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            if let Some(hint) = hint(e.kind) {
                eprintln!("Hint: {}", hint);
            }
            println!("\nOperation failed.");
            process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn get_password_reader(
    password: Option<String>,
    use_stdin: bool,
    mode: &str,
) -> Box<dyn PasswordReader> {
    let upstream: Box<dyn PasswordReader> = match password {
        Some(password) => Box::new(ConstantPasswordReader::new(password.into_bytes())),
        None if use_stdin => Box::new(ReaderPasswordReader::new(Box::new(std::io::stdin()))),
        None => Box::new(TerminalPasswordReader::new(format!("Password for {}: ", mode))),
    };
    Box::new(NonEmptyPasswordReader::new(upstream))
}

fn print_banner(mode: &str, input: &Path, output: &Path) {
    let rule = "=".repeat(50);
    println!("{}", rule);
    println!("Mode: {}", mode.to_uppercase());
    println!("Input file: {}", input.display());
    println!("Output file: {}", output.display());
    println!("{}\n", rule);
}

fn print_summary(command: &Commands, output: &Path, summary: &Summary) {
    match command {
        Commands::Encrypt { .. } => {
            println!("File encrypted and saved to '{}'.", output.display());
            println!("  - Original size: {} bytes", summary.input_len);
            println!("  - Encrypted size: {} bytes", summary.output_len);
        }
        Commands::Decrypt { .. } => {
            println!("File decrypted and saved to '{}'.", output.display());
            println!("  - File size: {} bytes", summary.output_len);
        }
    }
}

/// The error's message followed by each of its sources.
fn error_chain(err: &PwboxError) -> String {
    let mut chain = err.to_string();
    let mut source = StdError::source(err);
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::InvalidPasswordOrCorrupt => {
            Some("the password is wrong or the file is corrupt")
        }
        ErrorKind::SizeExceeded => Some("raise the limit with --max-size"),
        ErrorKind::EmptyPassword => Some("supply a non-empty password"),
        ErrorKind::PasswordUnavailable => Some("use --password or --password-stdin"),
        ErrorKind::NotFound | ErrorKind::Corrupt | ErrorKind::OperationFailed => None,
    }
}
