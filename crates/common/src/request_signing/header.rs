//! Parsing and formatting of the comma separated attribute lists carried in
//! `TBEP-Authorization` and `TBEP-Encrypt`.
//!
//! An attribute list looks like `key="value",key2=value2`. Whitespace around
//! each attribute is trimmed, as are the quotes around a value. Values may
//! contain `=` (base64 padding); only the first `=` separates key and value.

use std::collections::BTreeMap;

use error_stack::Report;

use crate::error::TbepError;

/// Parsed attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAttributes {
    attributes: BTreeMap<String, String>,
}

impl HeaderAttributes {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::MalformedHeader`] if the attribute is absent.
    pub fn require(&self, key: &str) -> Result<&str, Report<TbepError>> {
        self.get(key).ok_or_else(|| {
            Report::new(TbepError::malformed_header(format!(
                "missing required attribute `{key}`"
            )))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Splits an attribute list into a mapping from attribute name to value.
///
/// Empty segments (for example a trailing comma) are skipped.
///
/// # Errors
///
/// Returns [`TbepError::MalformedHeader`] if the header is empty, a segment has
/// no `=` or an empty name, or a name appears twice.
pub fn parse_header_attributes(header: &str) -> Result<HeaderAttributes, Report<TbepError>> {
    if header.trim().is_empty() {
        return Err(Report::new(TbepError::malformed_header(
            "header value is empty",
        )));
    }

    let mut attributes = BTreeMap::new();
    for segment in header.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            Report::new(TbepError::malformed_header(format!(
                "attribute `{segment}` has no value"
            )))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(Report::new(TbepError::malformed_header(format!(
                "attribute `{segment}` has no name"
            ))));
        }

        let value = value.trim().trim_matches('"');
        if attributes.insert(key.to_string(), value.to_string()).is_some() {
            return Err(Report::new(TbepError::malformed_header(format!(
                "duplicate attribute `{key}`"
            ))));
        }
    }

    Ok(HeaderAttributes { attributes })
}

/// Renders `(key, value)` pairs as `key="value",...` in the given order.
#[must_use]
pub fn format_header_attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Signature metadata carried in `TBEP-Authorization`.
///
/// Inbound headers name the key `tbep_serial_number`; outbound headers carry
/// `platform_id` and `platform_serial_number` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
    pub serial_number: String,
    /// Raw algorithm name; checked against
    /// [`SignatureAlgorithm`](super::SignatureAlgorithm) during verification.
    pub algorithm: String,
}

impl SignatureHeader {
    pub const TIMESTAMP: &'static str = "timestamp";
    pub const NONCE: &'static str = "nonce";
    pub const SIGNATURE: &'static str = "signature";
    pub const SERIAL_NUMBER: &'static str = "tbep_serial_number";
    pub const ALGORITHM: &'static str = "signature_algorithm";
    pub const PLATFORM_ID: &'static str = "platform_id";
    pub const PLATFORM_SERIAL_NUMBER: &'static str = "platform_serial_number";

    /// Parses an inbound `TBEP-Authorization` value.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::MalformedHeader`] if the value cannot be parsed or
    /// any of `timestamp`, `nonce`, `signature`, `tbep_serial_number` or
    /// `signature_algorithm` is missing.
    pub fn parse(header: &str) -> Result<Self, Report<TbepError>> {
        let attributes = parse_header_attributes(header)?;

        Ok(Self {
            timestamp: attributes.require(Self::TIMESTAMP)?.to_string(),
            nonce: attributes.require(Self::NONCE)?.to_string(),
            signature: attributes.require(Self::SIGNATURE)?.to_string(),
            serial_number: attributes.require(Self::SERIAL_NUMBER)?.to_string(),
            algorithm: attributes.require(Self::ALGORITHM)?.to_string(),
        })
    }

    /// Renders the header in the inbound layout.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        format_header_attributes([
            (Self::TIMESTAMP, self.timestamp.as_str()),
            (Self::NONCE, self.nonce.as_str()),
            (Self::SIGNATURE, self.signature.as_str()),
            (Self::SERIAL_NUMBER, self.serial_number.as_str()),
            (Self::ALGORITHM, self.algorithm.as_str()),
        ])
    }

    /// Renders the header as sent on outbound requests.
    #[must_use]
    pub fn to_outbound_header_value(&self, platform_id: &str) -> String {
        format_header_attributes([
            (Self::PLATFORM_ID, platform_id),
            (Self::PLATFORM_SERIAL_NUMBER, self.serial_number.as_str()),
            (Self::TIMESTAMP, self.timestamp.as_str()),
            (Self::NONCE, self.nonce.as_str()),
            (Self::SIGNATURE, self.signature.as_str()),
            (Self::ALGORITHM, self.algorithm.as_str()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_and_bare_attributes() {
        let attributes = parse_header_attributes(r#"a="1", b=2 ,c = "three""#)
            .expect("should parse attributes");

        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.get("a"), Some("1"));
        assert_eq!(attributes.get("b"), Some("2"));
        assert_eq!(attributes.get("c"), Some("three"));
    }

    #[test]
    fn test_parse_keeps_base64_padding() {
        let attributes =
            parse_header_attributes(r#"signature="YWJjZA==",nonce="n""#).expect("should parse");
        assert_eq!(attributes.get("signature"), Some("YWJjZA=="));
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        let attributes = parse_header_attributes("a=1,,b=2,").expect("should parse");
        assert_eq!(
            attributes.iter().collect::<Vec<_>>(),
            vec![("a", "1"), ("b", "2")]
        );
    }

    #[test]
    fn test_parse_empty_value() {
        let attributes = parse_header_attributes(r#"a="""#).expect("should parse");
        assert_eq!(attributes.get("a"), Some(""));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for header in ["", "   ", "novalue", "=orphan", r#"a="1",a="2""#] {
            let err = parse_header_attributes(header).expect_err("should reject header");
            assert!(
                matches!(err.current_context(), TbepError::MalformedHeader { .. }),
                "Expected MalformedHeader for {header:?}"
            );
        }
    }

    #[test]
    fn test_require_missing_attribute() {
        let attributes = parse_header_attributes("a=1").expect("should parse");
        let err = attributes.require("b").expect_err("should be missing");
        assert_eq!(
            err.current_context(),
            &TbepError::MalformedHeader {
                message: "missing required attribute `b`".into()
            }
        );
    }

    #[test]
    fn test_signature_header_parse() {
        let header = SignatureHeader::parse(
            r#"timestamp="1610000000",nonce="abc123",signature="c2ln",tbep_serial_number="SN1",signature_algorithm="SHA256-RSA2048""#,
        )
        .expect("should parse signature header");

        assert_eq!(header.timestamp, "1610000000");
        assert_eq!(header.nonce, "abc123");
        assert_eq!(header.signature, "c2ln");
        assert_eq!(header.serial_number, "SN1");
        assert_eq!(header.algorithm, "SHA256-RSA2048");
    }

    #[test]
    fn test_signature_header_requires_every_attribute() {
        let complete = SignatureHeader {
            timestamp: "1".into(),
            nonce: "n".into(),
            signature: "s".into(),
            serial_number: "SN1".into(),
            algorithm: "SHA256-RSA2048".into(),
        };
        let value = complete.to_header_value();
        assert_eq!(
            SignatureHeader::parse(&value).expect("should round trip"),
            complete
        );

        for missing in [
            SignatureHeader::TIMESTAMP,
            SignatureHeader::NONCE,
            SignatureHeader::SIGNATURE,
            SignatureHeader::SERIAL_NUMBER,
            SignatureHeader::ALGORITHM,
        ] {
            let partial = value
                .split(',')
                .filter(|segment| !segment.starts_with(&format!("{missing}=")))
                .collect::<Vec<_>>()
                .join(",");
            let err = SignatureHeader::parse(&partial).expect_err("should require attribute");
            assert!(
                err.current_context().to_string().contains(missing),
                "Error should name `{missing}`"
            );
        }
    }

    #[test]
    fn test_outbound_header_layout() {
        let header = SignatureHeader {
            timestamp: "1".into(),
            nonce: "n".into(),
            signature: "s==".into(),
            serial_number: "PSN".into(),
            algorithm: "SHA256-RSA2048".into(),
        };

        assert_eq!(
            header.to_outbound_header_value("pid"),
            r#"platform_id="pid",platform_serial_number="PSN",timestamp="1",nonce="n",signature="s==",signature_algorithm="SHA256-RSA2048""#
        );
    }
}
