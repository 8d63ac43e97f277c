//! RSA key loading and generation.
//!
//! Keys are accepted as PEM (PKCS#8 / SPKI or PKCS#1) or as bare base64 DER,
//! the form keys usually take when pasted from the merchant console.

use base64::{engine::general_purpose, Engine};
use error_stack::Report;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::TbepError;

const PEM_BEGIN: &str = "-----BEGIN";

/// Parses an RSA private key.
///
/// # Errors
///
/// Returns [`TbepError::Configuration`] if the text is neither a PKCS#8 nor a
/// PKCS#1 private key.
pub fn parse_private_key(text: &str) -> Result<RsaPrivateKey, Report<TbepError>> {
    let text = text.trim();

    let parsed = if text.starts_with(PEM_BEGIN) {
        RsaPrivateKey::from_pkcs8_pem(text)
            .ok()
            .or_else(|| RsaPrivateKey::from_pkcs1_pem(text).ok())
    } else {
        let der = decode_bare_der(text)?;
        RsaPrivateKey::from_pkcs8_der(&der)
            .ok()
            .or_else(|| RsaPrivateKey::from_pkcs1_der(&der).ok())
    };

    parsed.ok_or_else(|| {
        Report::new(TbepError::configuration(
            "Failed to parse RSA private key (expected PKCS#8 or PKCS#1)",
        ))
    })
}

/// Parses an RSA public key.
///
/// # Errors
///
/// Returns [`TbepError::Configuration`] if the text is neither an SPKI nor a
/// PKCS#1 public key.
pub fn parse_public_key(text: &str) -> Result<RsaPublicKey, Report<TbepError>> {
    let text = text.trim();

    let parsed = if text.starts_with(PEM_BEGIN) {
        RsaPublicKey::from_public_key_pem(text)
            .ok()
            .or_else(|| RsaPublicKey::from_pkcs1_pem(text).ok())
    } else {
        let der = decode_bare_der(text)?;
        RsaPublicKey::from_public_key_der(&der)
            .ok()
            .or_else(|| RsaPublicKey::from_pkcs1_der(&der).ok())
    };

    parsed.ok_or_else(|| {
        Report::new(TbepError::configuration(
            "Failed to parse RSA public key (expected SPKI or PKCS#1)",
        ))
    })
}

fn decode_bare_der(text: &str) -> Result<Vec<u8>, Report<TbepError>> {
    let compact: String = text.split_whitespace().collect();
    general_purpose::STANDARD.decode(compact).map_err(|e| {
        Report::new(TbepError::configuration(format!(
            "Failed to decode base64 key: {e}"
        )))
    })
}

pub struct Keypair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

impl Keypair {
    /// Generates a new RSA key pair of `bits` size.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Crypto`] if key generation fails.
    pub fn generate(bits: usize) -> Result<Self, Report<TbepError>> {
        let mut csprng = OsRng;

        let private_key = RsaPrivateKey::new(&mut csprng, bits).map_err(|e| {
            Report::new(TbepError::crypto(format!("Failed to generate RSA key: {e}")))
        })?;
        let public_key = private_key.to_public_key();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Renders the private key as PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Crypto`] if encoding fails.
    pub fn private_key_pem(&self) -> Result<String, Report<TbepError>> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| {
                Report::new(TbepError::crypto(format!(
                    "Failed to encode private key: {e}"
                )))
            })
    }

    /// Renders the public key as SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Crypto`] if encoding fails.
    pub fn public_key_pem(&self) -> Result<String, Report<TbepError>> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| {
                Report::new(TbepError::crypto(format!(
                    "Failed to encode public key: {e}"
                )))
            })
    }
}
