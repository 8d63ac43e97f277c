//! TBEP CLI for key management, signing and API requests.
//!
//! This tool provides commands for:
//! - Generating platform key pairs
//! - Signing bodies and verifying `TBEP-Authorization` headers offline
//! - Validating configuration files
//! - Sending signed requests to the TBEP API

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use tbep_common::logging::init_logging;

mod config;
mod error;
mod keys;
mod request;
mod sign;

use error::CliError;

#[derive(Parser)]
#[command(name = "tbepcli")]
#[command(about = "TBEP CLI for request signing and verification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Key management
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Print the TBEP-Authorization header for a request body
    Sign {
        /// Path to the TOML configuration file
        #[arg(long, short, env = "TBEP_CONFIG")]
        config: PathBuf,

        /// File holding the exact body bytes to sign
        #[arg(long)]
        body_file: PathBuf,

        /// Unix timestamp to sign with (default: now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Nonce to sign with (default: random)
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Verify a TBEP-Authorization header against a body
    Verify {
        /// Path to the TOML configuration file
        #[arg(long, short, env = "TBEP_CONFIG")]
        config: PathBuf,

        /// The TBEP-Authorization header value
        #[arg(long)]
        authorization: String,

        /// File holding the exact body bytes that were signed
        #[arg(long)]
        body_file: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Send a signed request to the TBEP API
    Request {
        /// Path to the TOML configuration file
        #[arg(long, short, env = "TBEP_CONFIG")]
        config: PathBuf,

        /// HTTP method
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Request path, relative to the configured endpoint
        #[arg(long, short)]
        path: String,

        /// JSON body to send
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Generate a platform RSA key pair
    Generate {
        /// Directory to write the PEM files into
        #[arg(long, short)]
        out_dir: PathBuf,

        /// Key size in bits
        #[arg(long, default_value_t = 2048)]
        bits: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config and every configured key
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Keys { action } => match action {
            KeysAction::Generate { out_dir, bits } => keys::generate(&out_dir, bits, cli.verbose),
        },
        Commands::Sign {
            config,
            body_file,
            timestamp,
            nonce,
        } => sign::sign(&config, &body_file, timestamp, nonce, cli.verbose).map(|_| ()),
        Commands::Verify {
            config,
            authorization,
            body_file,
        } => sign::verify(&config, &authorization, &body_file, cli.verbose),
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(&file, cli.verbose),
        },
        Commands::Request {
            config,
            method,
            path,
            data_file,
        } => request::send(&config, &method, &path, data_file.as_deref(), cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign_command() {
        let cli = Cli::try_parse_from([
            "tbepcli",
            "sign",
            "--config",
            "tbep.toml",
            "--body-file",
            "body.json",
            "--nonce",
            "n1",
        ])
        .unwrap();

        match cli.command {
            Commands::Sign {
                nonce, timestamp, ..
            } => {
                assert_eq!(nonce.as_deref(), Some("n1"));
                assert!(timestamp.is_none());
            }
            _ => panic!("Expected sign command"),
        }
    }

    #[test]
    fn test_parse_keys_generate_default_bits() {
        let cli =
            Cli::try_parse_from(["tbepcli", "keys", "generate", "--out-dir", "keys"]).unwrap();

        match cli.command {
            Commands::Keys {
                action: KeysAction::Generate { bits, .. },
            } => assert_eq!(bits, 2048),
            _ => panic!("Expected keys generate command"),
        }
    }
}
