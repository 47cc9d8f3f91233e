//! Hushlink CLI - password-sealed message links
//!
//! Command-line interface for sealing a short message into a URL-safe
//! token and opening such a token back into the message. The token
//! carries its own format version, KDF parameters and salt; only the
//! password travels separately.

use clap::{Parser, Subcommand};
use std::process;

use hushlink::error::{ErrorKind, HushlinkError};
use hushlink::kdf::DEFAULT_ITERATIONS;
use hushlink::password::{PasswordReader, ReaderPasswordReader, TerminalPasswordReader};
use hushlink::seal;

#[derive(Parser)]
#[command(name = "hushlink")]
#[command(version)]
#[command(about = "Seal a short message with a password into a URL-safe link token.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    password_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a message into a token
    #[command(alias = "s")]
    Seal {
        /// The message text to seal
        message: String,

        /// PBKDF2 iteration count to use for this message
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,

        /// Print a full shareable link instead of the bare token
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Open a token, or a full link containing one
    #[command(alias = "o")]
    Open {
        /// The token, or a link whose `m` query parameter holds it
        link: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let mut reader = get_password_reader(cli.password_stdin);

    let result = match cli.command {
        Commands::Seal {
            message,
            iterations,
            base_url,
        } => run_seal(&message, iterations, base_url.as_deref(), &mut *reader),
        Commands::Open { link } => run_open(&link, &mut *reader),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", user_message(&e));
            process::exit(1);
        }
    }
}

fn run_seal(
    message: &str,
    iterations: u32,
    base_url: Option<&str>,
    reader: &mut dyn PasswordReader,
) -> Result<String, HushlinkError> {
    let password = reader.read_password()?;
    let token = seal::seal_with_iterations(message, &password, iterations)?;

    Ok(match base_url {
        Some(base) => format!("{}/?m={}", base.trim_end_matches('/'), token),
        None => token,
    })
}

fn run_open(link: &str, reader: &mut dyn PasswordReader) -> Result<String, HushlinkError> {
    let password = reader.read_password()?;
    seal::open(extract_token(link), &password)
}

/// Pull the bare token out of a full link if one was pasted.
///
/// Accepts either the token itself or any string containing an
/// `m=<token>` query parameter.
fn extract_token(input: &str) -> &str {
    let input = input.trim();

    for marker in ["?m=", "&m="] {
        if let Some(idx) = input.find(marker) {
            let rest = &input[idx + marker.len()..];
            return match rest.find('&') {
                Some(end) => &rest[..end],
                None => rest,
            };
        }
    }

    input
}

/// Translate error kinds into the wording shown to the end user.
///
/// Wrong password and tampering share one message on purpose;
/// malformed links get their own, so a truncated copy-paste is not
/// mistaken for a wrong password.
fn user_message(e: &HushlinkError) -> String {
    match e.kind {
        Some(ErrorKind::AuthenticationFailed) => "wrong password or corrupted message".to_string(),
        Some(ErrorKind::MalformedPayload) => "this link is not a valid sealed message".to_string(),
        _ => e.message().to_string(),
    }
}

fn get_password_reader(use_stdin: bool) -> Box<dyn PasswordReader> {
    if use_stdin {
        Box::new(ReaderPasswordReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPasswordReader)
    }
}
