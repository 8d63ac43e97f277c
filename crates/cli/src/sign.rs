//! Offline signing and verification of `TBEP-Authorization` headers.

use std::fs;
use std::path::Path;

use tbep_common::request_signing::{current_timestamp, generate_nonce, verify_signature_header};

use crate::config::load_credentials;
use crate::error::CliError;

/// Print the `TBEP-Authorization` value the platform would send for the body
/// in `body_file`.
pub fn sign(
    config: &Path,
    body_file: &Path,
    timestamp: Option<String>,
    nonce: Option<String>,
    verbose: bool,
) -> Result<String, CliError> {
    let (_settings, credentials) = load_credentials(config, verbose)?;
    let body = fs::read(body_file)?;

    let timestamp = timestamp.unwrap_or_else(current_timestamp);
    let nonce = nonce.unwrap_or_else(generate_nonce);

    if verbose {
        println!("Body: {} bytes", body.len());
        println!("Timestamp: {}", timestamp);
        println!("Nonce: {}", nonce);
    }

    let authorization = credentials
        .signer()
        .authorize_with(&timestamp, &nonce, &body)?;
    println!("{}", authorization);

    Ok(authorization)
}

/// Verify a `TBEP-Authorization` value against the body in `body_file`.
pub fn verify(
    config: &Path,
    authorization: &str,
    body_file: &Path,
    verbose: bool,
) -> Result<(), CliError> {
    let (_settings, credentials) = load_credentials(config, verbose)?;
    let body = fs::read(body_file)?;

    let outcome = verify_signature_header(&credentials, authorization, &body);
    match outcome.error() {
        None => {
            println!("Signature verified");
            Ok(())
        }
        Some(error) => Err(CliError::Verification(error.to_string())),
    }
}
