//! Configuration management and validation.
//!
//! Settings are read from a TOML document and merged with environment
//! variables prefixed with `TBEP__`. For example,
//! `TBEP__CREDENTIALS__PLATFORM_ID` overrides `credentials.platform_id`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, SIGNATURE_ALGORITHM_SHA256_RSA2048};
use crate::error::TbepError;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "TBEP";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientSettings {
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Overall request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub timeout_ms: u64,
}

impl ClientSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// A TBEP platform certificate used to verify inbound signatures.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TbepCertificate {
    #[validate(length(min = 1))]
    pub serial_number: String,

    /// PEM (SPKI or PKCS#1) or bare base64 DER.
    #[validate(length(min = 1))]
    pub public_key: String,
}

#[derive(Clone, Deserialize, Validate)]
pub struct CredentialSettings {
    #[validate(length(min = 1))]
    pub platform_id: String,

    /// Serial number of the certificate matching `platform_private_key`.
    #[validate(length(min = 1))]
    pub platform_serial_number: String,

    /// PEM (PKCS#8 or PKCS#1) or bare base64 DER.
    #[validate(length(min = 1))]
    pub platform_private_key: String,

    #[serde(default = "default_signature_algorithm")]
    pub signature_algorithm: String,

    #[validate(length(min = 1), nested)]
    pub tbep_certificates: Vec<TbepCertificate>,
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("platform_id", &self.platform_id)
            .field("platform_serial_number", &self.platform_serial_number)
            .field("platform_private_key", &"[REDACTED]")
            .field("signature_algorithm", &self.signature_algorithm)
            .field("tbep_certificates", &self.tbep_certificates)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub client: ClientSettings,

    #[validate(nested)]
    pub credentials: CredentialSettings,
}

impl Settings {
    /// Parses settings from a TOML string, applying `TBEP__` environment
    /// overrides, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns a [`TbepError::Configuration`] if the TOML is invalid, required
    /// fields are missing, or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<TbepError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .map_err(|e| {
                Report::new(TbepError::configuration(format!(
                    "Failed to build configuration: {e}"
                )))
            })?;

        let settings: Self = config.try_deserialize().map_err(|e| {
            Report::new(TbepError::configuration(format!(
                "Failed to deserialize configuration: {e}"
            )))
        })?;

        settings
            .validate()
            .change_context(TbepError::configuration("Settings validation failed"))?;

        Ok(settings)
    }

    /// Reads and parses a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns a [`TbepError::Configuration`] if the file cannot be read or
    /// [`Settings::from_toml`] fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Report<TbepError>> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Report::new(TbepError::configuration(format!(
                "Failed to read '{}': {e}",
                path.display()
            )))
        })?;

        Self::from_toml(&toml_str).attach(format!("while loading {}", path.display()))
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_signature_algorithm() -> String {
    SIGNATURE_ALGORITHM_SHA256_RSA2048.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tests::crate_test_settings_str;

    #[test]
    fn test_settings_from_valid_toml() {
        let settings =
            Settings::from_toml(&crate_test_settings_str()).expect("should parse test settings");

        assert_eq!(settings.client.endpoint, "https://api.business.tenpay.com");
        assert_eq!(settings.client.timeout(), Duration::from_millis(15_000));
        assert_eq!(settings.credentials.platform_serial_number, "PLATFORM-SN");
        assert_eq!(settings.credentials.signature_algorithm, "SHA256-RSA2048");
        assert_eq!(settings.credentials.tbep_certificates.len(), 1);
        assert_eq!(settings.credentials.tbep_certificates[0].serial_number, "SN1");
    }

    #[test]
    fn test_settings_client_defaults() {
        let toml_str = r#"
            [credentials]
            platform_id = "p"
            platform_serial_number = "psn"
            platform_private_key = "key"

            [[credentials.tbep_certificates]]
            serial_number = "SN1"
            public_key = "key"
            "#;

        let settings = Settings::from_toml(toml_str).expect("should apply defaults");
        assert_eq!(settings.client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.client.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(
            settings.credentials.signature_algorithm,
            SIGNATURE_ALGORITHM_SHA256_RSA2048
        );
    }

    #[test]
    fn test_settings_missing_required_fields() {
        let toml_str = r#"
            [credentials]
            platform_id = "p"
            # Missing platform_serial_number

            [[credentials.tbep_certificates]]
            serial_number = "SN1"
            public_key = "key"
            "#;

        let result = Settings::from_toml(toml_str);
        assert!(result.is_err(), "Should fail when required fields are missing");
    }

    #[test]
    fn test_settings_rejects_empty_certificate_list() {
        let toml_str = r#"
            [credentials]
            platform_id = "p"
            platform_serial_number = "psn"
            platform_private_key = "key"
            tbep_certificates = []
            "#;

        let err = Settings::from_toml(toml_str).expect_err("should reject empty certificates");
        assert!(matches!(
            err.current_context(),
            TbepError::Configuration { .. }
        ));
        assert!(
            format!("{err:?}").contains("tbep_certificates"),
            "validation report should name the empty list"
        );
    }

    #[test]
    fn test_settings_rejects_invalid_endpoint() {
        let toml_str = r#"
            [client]
            endpoint = "not a url"

            [credentials]
            platform_id = "p"
            platform_serial_number = "psn"
            platform_private_key = "key"

            [[credentials.tbep_certificates]]
            serial_number = "SN1"
            public_key = "key"
            "#;

        assert!(Settings::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_settings_empty_toml() {
        assert!(Settings::from_toml("").is_err(), "Should fail with empty TOML");
    }

    #[test]
    fn test_settings_invalid_toml_syntax() {
        let toml_str = r#"
            [credentials
            platform_id = "p"
            "#;

        assert!(Settings::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_settings_debug_redacts_private_key() {
        let settings =
            Settings::from_toml(&crate_test_settings_str()).expect("should parse test settings");
        let debug = format!("{settings:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("PRIVATE KEY"));
    }

    // Must only touch `platform_id`: no other test asserts on it.
    #[test]
    fn test_override_env() {
        temp_env::with_var(
            "TBEP__CREDENTIALS__PLATFORM_ID",
            Some("env-platform"),
            || {
                let settings = Settings::from_toml(&crate_test_settings_str())
                    .expect("should parse test settings");
                assert_eq!(settings.credentials.platform_id, "env-platform");
            },
        );
    }

    #[test]
    fn test_settings_from_missing_file() {
        let result = Settings::from_file("/nonexistent/tbep.toml");
        assert!(result.is_err());
    }
}
