//! CLI error types.

use std::fmt;

use error_stack::Report;
use tbep_common::error::TbepError;
use tbep_common::logging::is_debug_enabled;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// Signing, key or header error
    Tbep(String),
    /// Signature did not verify
    Verification(String),
    /// IO error
    Io(std::io::Error),
    /// HTTP request error
    Http(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Tbep(msg) => write!(f, "TBEP error: {}", msg),
            CliError::Verification(msg) => write!(f, "Verification failed: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<Report<TbepError>> for CliError {
    fn from(report: Report<TbepError>) -> Self {
        // The full report tree is only useful with --verbose.
        let message = if is_debug_enabled() {
            format!("{report:?}")
        } else {
            report.current_context().to_string()
        };

        match report.current_context() {
            TbepError::Configuration { .. } => CliError::Config(message),
            TbepError::Http { .. } => CliError::Http(message),
            _ => CliError::Tbep(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_cli_error_display() {
        assert_eq!(
            format!("{}", CliError::Config("test".into())),
            "Configuration error: test"
        );
        assert_eq!(
            format!("{}", CliError::Tbep("test".into())),
            "TBEP error: test"
        );
        assert_eq!(
            format!("{}", CliError::Verification("test".into())),
            "Verification failed: test"
        );
        assert_eq!(
            format!("{}", CliError::Http("test".into())),
            "HTTP error: test"
        );
    }

    #[test]
    fn test_cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        match cli_err {
            CliError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_cli_error_from_report() {
        let report = Report::new(TbepError::Configuration {
            message: "bad key".into(),
        });
        assert!(matches!(CliError::from(report), CliError::Config(_)));

        let report = Report::new(TbepError::UnknownKey {
            serial_number: "SN9".into(),
        });
        match CliError::from(report) {
            CliError::Tbep(msg) => assert!(msg.contains("SN9")),
            other => panic!("Expected Tbep variant, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_error_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.source().is_some());

        let config_err = CliError::Config("test".into());
        assert!(config_err.source().is_none());
    }
}
