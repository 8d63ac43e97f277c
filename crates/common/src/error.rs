use thiserror::Error;

/// Errors raised while signing requests, verifying signatures or talking to
/// the TBEP API.
///
/// `MalformedHeader`, `UnknownKey`, `UnsupportedAlgorithm` and `Crypto` make up
/// the verification taxonomy. The verification entry points never return them
/// as `Err`; they travel inside a
/// [`VerificationOutcome`](crate::request_signing::VerificationOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TbepError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Malformed header: {message}")]
    MalformedHeader { message: String },

    #[error("No public key registered for serial number '{serial_number}'")]
    UnknownKey { serial_number: String },

    #[error("Unsupported signature algorithm '{algorithm}'")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Cryptographic failure: {message}")]
    Crypto { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("HTTP error: {message}")]
    Http { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TbepError {
    pub(crate) fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TbepError::UnknownKey {
                serial_number: "SN2".into()
            }
            .to_string(),
            "No public key registered for serial number 'SN2'"
        );
        assert_eq!(
            TbepError::UnsupportedAlgorithm {
                algorithm: "HMAC-SHA256".into()
            }
            .to_string(),
            "Unsupported signature algorithm 'HMAC-SHA256'"
        );
        assert_eq!(
            TbepError::malformed_header("missing `nonce`").to_string(),
            "Malformed header: missing `nonce`"
        );
    }
}
