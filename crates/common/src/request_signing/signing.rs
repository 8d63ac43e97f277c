//! Request signing and verification utilities.
//!
//! Signatures are SHA256withRSA (PKCS#1 v1.5) over the canonical plaintext
//! `"{timestamp}\n{nonce}\n{body}\n"`, transported as standard base64.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine};
use error_stack::Report;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::constants::SIGNATURE_ALGORITHM_SHA256_RSA2048;
use crate::error::TbepError;

use super::header::SignatureHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha256WithRsa,
}

impl SignatureAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256WithRsa => SIGNATURE_ALGORITHM_SHA256_RSA2048,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Report<TbepError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SIGNATURE_ALGORITHM_SHA256_RSA2048 => Ok(Self::Sha256WithRsa),
            other => Err(Report::new(TbepError::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            })),
        }
    }
}

/// Builds the canonical plaintext a signature is computed over.
///
/// Newlines inside `body` are not escaped; the remote platform computes the
/// same bytes.
#[must_use]
pub fn build_plaintext(timestamp: &str, nonce: &str, body: impl AsRef<[u8]>) -> Vec<u8> {
    let body = body.as_ref();
    let mut plaintext = Vec::with_capacity(timestamp.len() + nonce.len() + body.len() + 3);
    plaintext.extend_from_slice(timestamp.as_bytes());
    plaintext.push(b'\n');
    plaintext.extend_from_slice(nonce.as_bytes());
    plaintext.push(b'\n');
    plaintext.extend_from_slice(body);
    plaintext.push(b'\n');
    plaintext
}

/// Signs `plaintext` with SHA256withRSA.
///
/// # Errors
///
/// Returns [`TbepError::Signing`] if the private key cannot produce a signature.
pub fn sign_plaintext(
    plaintext: &[u8],
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>, Report<TbepError>> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key.try_sign(plaintext).map_err(|e| {
        Report::new(TbepError::Signing {
            message: format!("Failed to sign plaintext: {e}"),
        })
    })?;

    Ok(signature.to_vec())
}

/// Returns `true` only when `signature` is a valid SHA256withRSA signature of
/// `plaintext` under `public_key`. Malformed signatures are `false`.
#[must_use]
pub fn verify_plaintext(plaintext: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };

    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    verifying_key.verify(plaintext, &signature).is_ok()
}

/// Generates a fresh 32 character hex nonce.
#[must_use]
pub fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Current unix time in seconds, as sent in `timestamp`.
#[must_use]
pub fn current_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Signs outbound requests with the platform's private key.
pub struct RequestSigner {
    key: RsaPrivateKey,
    pub platform_id: String,
    pub serial_number: String,
    pub algorithm: SignatureAlgorithm,
}

impl RequestSigner {
    #[must_use]
    pub fn new(
        key: RsaPrivateKey,
        platform_id: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            key,
            platform_id: platform_id.into(),
            serial_number: serial_number.into(),
            algorithm: SignatureAlgorithm::Sha256WithRsa,
        }
    }

    /// Signs `plaintext` and returns the standard base64 signature.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Signing`] if signing fails.
    pub fn sign(&self, plaintext: &[u8]) -> Result<String, Report<TbepError>> {
        let signature_bytes = sign_plaintext(plaintext, &self.key)?;

        Ok(general_purpose::STANDARD.encode(signature_bytes))
    }

    /// Builds the `TBEP-Authorization` value for `body` with a fresh
    /// timestamp and nonce.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Signing`] if signing fails.
    pub fn authorize(&self, body: &[u8]) -> Result<String, Report<TbepError>> {
        self.authorize_with(&current_timestamp(), &generate_nonce(), body)
    }

    /// Deterministic form of [`RequestSigner::authorize`].
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Signing`] if signing fails.
    pub fn authorize_with(
        &self,
        timestamp: &str,
        nonce: &str,
        body: &[u8],
    ) -> Result<String, Report<TbepError>> {
        let plaintext = build_plaintext(timestamp, nonce, body);
        let signature = self.sign(&plaintext)?;

        log::debug!(
            "Signed request: serial_number={} timestamp={} nonce={}",
            self.serial_number,
            timestamp,
            nonce
        );

        Ok(SignatureHeader {
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
            signature,
            serial_number: self.serial_number.clone(),
            algorithm: self.algorithm.as_str().to_string(),
        }
        .to_outbound_header_value(&self.platform_id))
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("platform_id", &self.platform_id)
            .field("serial_number", &self.serial_number)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
