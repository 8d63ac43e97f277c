use http::header::HeaderName;

pub const HEADER_TBEP_AUTHORIZATION: HeaderName = HeaderName::from_static("tbep-authorization");
pub const HEADER_TBEP_ENCRYPT: HeaderName = HeaderName::from_static("tbep-encrypt");

/// Production API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.business.tenpay.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const SIGNATURE_ALGORITHM_SHA256_RSA2048: &str = "SHA256-RSA2048";
pub const ENCRYPTION_ALGORITHM_RSA_OAEP_SM4_128_CBC: &str = "RSA-OAEP+SM4-128-CBC";

pub const CONTENT_TYPE_JSON: &str = "application/json";
