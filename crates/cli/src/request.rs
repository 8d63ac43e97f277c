//! Signed request against the live TBEP API.

use std::fs;
use std::path::Path;

use http::Method;
use tbep_client::{RequestOptions, TbepClient, TbepResponse};
use tbep_common::constants::CONTENT_TYPE_JSON;
use tbep_common::settings::Settings;

use crate::error::CliError;

pub(crate) fn parse_method(method: &str) -> Result<Method, CliError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| CliError::Config(format!("Invalid HTTP method '{method}': {e}")))
}

/// Send a signed request and print the response with its verification status.
pub fn send(
    config: &Path,
    method: &str,
    path: &str,
    data_file: Option<&Path>,
    verbose: bool,
) -> Result<(), CliError> {
    let method = parse_method(method)?;
    let body = data_file.map(fs::read).transpose()?;

    if verbose {
        println!("Loading config from: {}", config.display());
    }
    let settings = Settings::from_file(config)?;
    let client = TbepClient::new(&settings)?;

    let request = client.create_request(method, &[path], &RequestOptions::default())?;
    if verbose {
        println!("{} {}", request.method(), request.url());
    }

    let response: TbepResponse<serde_json::Value> =
        client.send_request(request, body.map(|bytes| (bytes, CONTENT_TYPE_JSON)))?;

    println!("Status: {}", response.status);
    if !response.is_successful() {
        println!("{}", String::from_utf8_lossy(&response.raw_body));
    } else if !response.data.is_null() {
        let pretty = serde_json::to_string_pretty(&response.data)
            .map_err(|e| CliError::Tbep(format!("Failed to render response: {e}")))?;
        println!("{}", pretty);
    }

    let outcome = client.verify_response_signature(&response);
    match outcome.error() {
        None => println!("Response signature: verified"),
        Some(error) => println!("Response signature: NOT verified ({})", error),
    }

    if let Some(error) = &response.error {
        return Err(CliError::Http(format!(
            "{} {}",
            error.code.as_deref().unwrap_or("UNKNOWN"),
            error.message.as_deref().unwrap_or_default()
        )));
    }

    Ok(())
}
