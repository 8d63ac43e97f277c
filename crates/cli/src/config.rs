//! Configuration commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `TBEP__`. For example, `TBEP__CLIENT__TIMEOUT_MS` will override
//! `client.timeout_ms` in the TOML file.

use std::path::Path;

use tbep_common::request_signing::CredentialSet;
use tbep_common::settings::Settings;

use crate::error::CliError;

/// Load, merge and validate configuration, then build the credential set from it.
///
/// Building the credential set parses every key, so a config that loads here
/// can sign and verify.
pub(crate) fn load_credentials(
    file: &Path,
    verbose: bool,
) -> Result<(Settings, CredentialSet), CliError> {
    if verbose {
        println!("Loading config from: {}", file.display());
        println!("Environment variables with TBEP__ prefix will be merged");
    }

    let settings = Settings::from_file(file)?;
    let credentials = CredentialSet::from_settings(&settings.credentials)?;

    Ok((settings, credentials))
}

/// Validate configuration file.
///
/// Validates TOML syntax, required fields and every configured key.
pub fn validate(file: &Path, verbose: bool) -> Result<(), CliError> {
    let (settings, credentials) = load_credentials(file, verbose)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Endpoint: {}", settings.client.endpoint);
    println!("  Platform ID: {}", settings.credentials.platform_id);
    println!(
        "  Platform serial number: {}",
        settings.credentials.platform_serial_number
    );

    if verbose {
        println!("  Timeout: {} ms", settings.client.timeout_ms);
        println!("  Signature algorithm: {}", credentials.signer().algorithm);
        println!("\nTBEP certificates:");
        for serial_number in credentials.serial_numbers() {
            println!("  - {}", serial_number);
        }
    }

    Ok(())
}
