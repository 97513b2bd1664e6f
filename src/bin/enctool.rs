//! enctool CLI - Password-based file encryption
//!
//! Encrypts or decrypts one file with AES-256-CBC under a key derived from
//! a password.

use clap::Parser;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use enctool::CryptError;
use enctool::file_ops;
use enctool::passphrase::{ConstantPassphraseReader, PassphraseReader, ReaderPassphraseReader};

#[derive(Parser)]
#[command(name = "enctool")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Decrypt the input file instead of encrypting it
    #[arg(short = 'd', long = "decrypt")]
    decrypt: bool,

    /// Read the password from stdin instead of the command line
    #[arg(long)]
    passphrase_stdin: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    log_level: String,

    /// Path to the file to read
    input_file: PathBuf,

    /// Path to the file to write
    output_file: PathBuf,

    /// Password to derive the key from
    #[arg(
        required_unless_present = "passphrase_stdin",
        conflicts_with = "passphrase_stdin",
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(OsString)
    )]
    password: Option<OsString>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                e.exit()
            }
            _ => {
                print_usage();
                process::exit(1);
            }
        },
    };

    init_logging(&cli.log_level);

    let mut reader = get_passphrase_reader(cli.passphrase_stdin, cli.password);
    let (action, result) = if cli.decrypt {
        (
            "decrypting",
            reader.read_passphrase().and_then(|password| {
                file_ops::decrypt_file(&cli.input_file, &cli.output_file, &password)
            }),
        )
    } else {
        (
            "encrypting",
            reader.read_passphrase().and_then(|password| {
                file_ops::encrypt_file(&cli.input_file, &cli.output_file, &password)
            }),
        )
    };

    if let Err(e) = result {
        report(action, &e);
        process::exit(1);
    }

    println!("Operation completed successfully");
}

fn print_usage() {
    println!("Usage:");
    println!("  enctool input_file output_file password  - Encrypt the file");
    println!("  enctool -d input_file output_file password  - Decrypt the file");
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn get_passphrase_reader(
    use_stdin: bool,
    password: Option<OsString>,
) -> Box<dyn PassphraseReader> {
    match password {
        Some(password) if !use_stdin => {
            Box::new(ConstantPassphraseReader::new(password.into_encoded_bytes()))
        }
        _ => Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin()))),
    }
}

fn report(action: &str, err: &CryptError) {
    eprintln!("Error {} file: {}", action, err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
