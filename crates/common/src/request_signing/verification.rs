//! Verification of inbound signatures.
//!
//! The entry points here never return `Err` and never panic on untrusted
//! input. They return a [`VerificationOutcome`] carrying a pass/fail verdict
//! and, on failure, the step that failed.

use base64::{engine::general_purpose, Engine};
use error_stack::Report;

use crate::error::TbepError;

use super::credentials::PublicKeyResolver;
use super::header::SignatureHeader;
use super::signing::{build_plaintext, verify_plaintext, SignatureAlgorithm};

/// Result of a signature check.
#[must_use = "a signature check is meaningless unless its outcome is examined"]
#[derive(Debug)]
pub struct VerificationOutcome {
    error: Option<Report<TbepError>>,
}

impl VerificationOutcome {
    fn verified() -> Self {
        Self { error: None }
    }

    fn failed(error: Report<TbepError>) -> Self {
        Self { error: Some(error) }
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.error.is_none()
    }

    /// Why verification failed; `None` when it succeeded.
    #[must_use]
    pub fn error(&self) -> Option<&TbepError> {
        self.error.as_ref().map(Report::current_context)
    }

    #[must_use]
    pub fn report(&self) -> Option<&Report<TbepError>> {
        self.error.as_ref()
    }

    /// Converts the outcome for callers that prefer `?`.
    ///
    /// # Errors
    ///
    /// Returns the failure report when verification failed.
    pub fn into_result(self) -> Result<(), Report<TbepError>> {
        match self.error {
            None => Ok(()),
            Some(report) => Err(report),
        }
    }
}

/// Signature fields for callers that already hold them individually.
#[derive(Debug, Clone, Copy)]
pub struct SignatureParts<'a> {
    pub timestamp: &'a str,
    pub nonce: &'a str,
    pub signature: &'a str,
    pub serial_number: &'a str,
    pub algorithm: &'a str,
}

impl<'a> SignatureParts<'a> {
    /// Parts with the default `SHA256-RSA2048` algorithm.
    #[must_use]
    pub fn new(
        timestamp: &'a str,
        nonce: &'a str,
        signature: &'a str,
        serial_number: &'a str,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            signature,
            serial_number,
            algorithm: SignatureAlgorithm::Sha256WithRsa.as_str(),
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: &'a str) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Verifies a `TBEP-Authorization` header against `body`.
///
/// Steps, each of which short-circuits on failure: parse the header, check
/// the algorithm, resolve the serial number, build the canonical plaintext,
/// check the signature.
pub fn verify_signature_header<R>(
    resolver: &R,
    authorization: &str,
    body: impl AsRef<[u8]>,
) -> VerificationOutcome
where
    R: PublicKeyResolver + ?Sized,
{
    let header = match SignatureHeader::parse(authorization) {
        Ok(header) => header,
        Err(report) => {
            log::warn!("Signature verification failed: {report}");
            return VerificationOutcome::failed(report);
        }
    };

    verify_signature_parts(
        resolver,
        SignatureParts {
            timestamp: &header.timestamp,
            nonce: &header.nonce,
            signature: &header.signature,
            serial_number: &header.serial_number,
            algorithm: &header.algorithm,
        },
        body,
    )
}

/// Verifies already separated signature fields against `body`.
pub fn verify_signature_parts<R>(
    resolver: &R,
    parts: SignatureParts<'_>,
    body: impl AsRef<[u8]>,
) -> VerificationOutcome
where
    R: PublicKeyResolver + ?Sized,
{
    match check_signature(resolver, parts, body.as_ref()) {
        Ok(()) => {
            log::debug!(
                "Signature verified: serial_number={} nonce={}",
                parts.serial_number,
                parts.nonce
            );
            VerificationOutcome::verified()
        }
        Err(report) => {
            log::warn!(
                "Signature verification failed: serial_number={} nonce={}: {report}",
                parts.serial_number,
                parts.nonce
            );
            VerificationOutcome::failed(report)
        }
    }
}

fn check_signature<R>(
    resolver: &R,
    parts: SignatureParts<'_>,
    body: &[u8],
) -> Result<(), Report<TbepError>>
where
    R: PublicKeyResolver + ?Sized,
{
    match parts.algorithm.parse::<SignatureAlgorithm>()? {
        SignatureAlgorithm::Sha256WithRsa => {}
    }

    let public_key = resolver.resolve_public_key(parts.serial_number)?;

    let signature = general_purpose::STANDARD
        .decode(parts.signature)
        .map_err(|e| Report::new(TbepError::crypto(format!("Failed to decode signature: {e}"))))?;

    let plaintext = build_plaintext(parts.timestamp, parts.nonce, body);
    if verify_plaintext(&plaintext, &signature, public_key) {
        Ok(())
    } else {
        Err(Report::new(TbepError::crypto("signature does not match")))
    }
}
