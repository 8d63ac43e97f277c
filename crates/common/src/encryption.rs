//! Symmetric-key transport metadata carried in `TBEP-Encrypt`.
//!
//! Only the header is handled here. Decrypting the sensitive fields it
//! describes is left to the caller.

use error_stack::Report;

use crate::constants::ENCRYPTION_ALGORITHM_RSA_OAEP_SM4_128_CBC;
use crate::error::TbepError;
use crate::request_signing::{format_header_attributes, parse_header_attributes};

/// Encryption metadata attached to an outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEncryption {
    /// Symmetric key, encrypted with the TBEP platform public key.
    pub encrypted_key: String,
    pub iv: String,
    /// Serial number of the TBEP certificate used to encrypt the key.
    pub serial_number: String,
    /// Defaults to [`ENCRYPTION_ALGORITHM_RSA_OAEP_SM4_128_CBC`] when unset.
    pub algorithm: Option<String>,
}

impl RequestEncryption {
    #[must_use]
    pub fn algorithm(&self) -> &str {
        self.algorithm
            .as_deref()
            .unwrap_or(ENCRYPTION_ALGORITHM_RSA_OAEP_SM4_128_CBC)
    }

    #[must_use]
    pub fn to_header_value(&self) -> String {
        format_header_attributes([
            ("enc_key", self.encrypted_key.as_str()),
            ("iv", self.iv.as_str()),
            ("tbep_serial_number", self.serial_number.as_str()),
            ("algorithm", self.algorithm()),
        ])
    }
}

/// Encryption metadata returned by the platform on a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEncryption {
    pub platform_id: String,
    pub encrypted_key: String,
    pub iv: String,
    /// Serial number of the platform certificate the key was encrypted for.
    pub serial_number: String,
    pub algorithm: String,
}

impl ResponseEncryption {
    /// Parses a response `TBEP-Encrypt` value.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::MalformedHeader`] if the value cannot be parsed or
    /// any of `platform_id`, `enc_key`, `iv`, `platform_serial_number` or
    /// `algorithm` is missing.
    pub fn parse(header: &str) -> Result<Self, Report<TbepError>> {
        let attributes = parse_header_attributes(header)?;

        Ok(Self {
            platform_id: attributes.require("platform_id")?.to_string(),
            encrypted_key: attributes.require("enc_key")?.to_string(),
            iv: attributes.require("iv")?.to_string(),
            serial_number: attributes.require("platform_serial_number")?.to_string(),
            algorithm: attributes.require("algorithm")?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encryption_header_default_algorithm() {
        let encryption = RequestEncryption {
            encrypted_key: "a2V5".into(),
            iv: "aXY=".into(),
            serial_number: "SN1".into(),
            algorithm: None,
        };

        assert_eq!(
            encryption.to_header_value(),
            r#"enc_key="a2V5",iv="aXY=",tbep_serial_number="SN1",algorithm="RSA-OAEP+SM4-128-CBC""#
        );
    }

    #[test]
    fn test_request_encryption_header_explicit_algorithm() {
        let encryption = RequestEncryption {
            algorithm: Some("CUSTOM".into()),
            ..Default::default()
        };

        assert!(encryption.to_header_value().ends_with(r#"algorithm="CUSTOM""#));
    }

    #[test]
    fn test_response_encryption_parse() {
        let encryption = ResponseEncryption::parse(
            r#"platform_id="p1", enc_key="a2V5==", iv="aXY=", platform_serial_number="PSN", algorithm="RSA-OAEP+SM4-128-CBC""#,
        )
        .expect("should parse encryption header");

        assert_eq!(
            encryption,
            ResponseEncryption {
                platform_id: "p1".into(),
                encrypted_key: "a2V5==".into(),
                iv: "aXY=".into(),
                serial_number: "PSN".into(),
                algorithm: "RSA-OAEP+SM4-128-CBC".into(),
            }
        );
    }

    #[test]
    fn test_response_encryption_missing_attribute() {
        let err = ResponseEncryption::parse(r#"platform_id="p1",enc_key="k",iv="v",algorithm="a""#)
            .expect_err("should require platform_serial_number");

        assert_eq!(
            err.current_context(),
            &TbepError::MalformedHeader {
                message: "missing required attribute `platform_serial_number`".into()
            }
        );
    }
}
