//! Credential Set: the platform signing key plus the TBEP public keys used to
//! verify inbound signatures, looked up by certificate serial number.

use std::collections::HashMap;

use error_stack::{Report, ResultExt};
use rsa::RsaPublicKey;

use crate::error::TbepError;
use crate::settings::CredentialSettings;

use super::keys::{parse_private_key, parse_public_key};
use super::signing::{RequestSigner, SignatureAlgorithm};

/// Resolves a certificate serial number to the public key that verifies
/// signatures made under it.
pub trait PublicKeyResolver {
    /// # Errors
    ///
    /// Returns [`TbepError::UnknownKey`] when no key is registered for
    /// `serial_number`.
    fn resolve_public_key(&self, serial_number: &str) -> Result<&RsaPublicKey, Report<TbepError>>;
}

/// Immutable after construction; share it by reference (or `Arc`) across
/// threads.
#[derive(Debug)]
pub struct CredentialSet {
    signer: RequestSigner,
    public_keys: HashMap<String, RsaPublicKey>,
}

impl CredentialSet {
    /// # Errors
    ///
    /// Returns [`TbepError::Configuration`] if `public_keys` is empty or holds
    /// the same serial number twice.
    pub fn new(
        signer: RequestSigner,
        public_keys: impl IntoIterator<Item = (String, RsaPublicKey)>,
    ) -> Result<Self, Report<TbepError>> {
        let mut registered = HashMap::new();
        for (serial_number, public_key) in public_keys {
            if registered.contains_key(&serial_number) {
                return Err(Report::new(TbepError::configuration(format!(
                    "Duplicate TBEP certificate serial number '{serial_number}'"
                ))));
            }
            registered.insert(serial_number, public_key);
        }

        if registered.is_empty() {
            return Err(Report::new(TbepError::configuration(
                "At least one TBEP certificate is required",
            )));
        }

        Ok(Self {
            signer,
            public_keys: registered,
        })
    }

    /// Builds the Credential Set from validated settings, parsing every key.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Configuration`] if a key cannot be parsed, the
    /// configured algorithm is not supported, or [`CredentialSet::new`] fails.
    pub fn from_settings(settings: &CredentialSettings) -> Result<Self, Report<TbepError>> {
        let algorithm: SignatureAlgorithm = settings
            .signature_algorithm
            .parse()
            .change_context(TbepError::configuration("Invalid `signature_algorithm`"))?;

        let private_key = parse_private_key(&settings.platform_private_key)
            .attach("while loading `platform_private_key`")?;

        let mut signer = RequestSigner::new(
            private_key,
            settings.platform_id.clone(),
            settings.platform_serial_number.clone(),
        );
        signer.algorithm = algorithm;

        let mut public_keys = Vec::with_capacity(settings.tbep_certificates.len());
        for certificate in &settings.tbep_certificates {
            let public_key = parse_public_key(&certificate.public_key).attach(format!(
                "while loading public key for serial number '{}'",
                certificate.serial_number
            ))?;
            public_keys.push((certificate.serial_number.clone(), public_key));
        }

        log::debug!(
            "Loaded credentials: platform_serial_number={} tbep_serial_numbers={:?}",
            settings.platform_serial_number,
            settings
                .tbep_certificates
                .iter()
                .map(|c| c.serial_number.as_str())
                .collect::<Vec<_>>()
        );

        Self::new(signer, public_keys)
    }

    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Registered TBEP serial numbers, sorted.
    #[must_use]
    pub fn serial_numbers(&self) -> Vec<&str> {
        let mut serial_numbers: Vec<&str> = self.public_keys.keys().map(String::as_str).collect();
        serial_numbers.sort_unstable();
        serial_numbers
    }
}

impl PublicKeyResolver for CredentialSet {
    fn resolve_public_key(&self, serial_number: &str) -> Result<&RsaPublicKey, Report<TbepError>> {
        self.public_keys.get(serial_number).ok_or_else(|| {
            Report::new(TbepError::UnknownKey {
                serial_number: serial_number.to_string(),
            })
        })
    }
}
