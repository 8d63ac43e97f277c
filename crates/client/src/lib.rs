//! Blocking HTTP client for the TBEP API.
//!
//! [`TbepClient`] signs every outbound request with the platform key and
//! exposes verification of response and event notification signatures
//! against the configured TBEP certificates.
//!
//! ```no_run
//! use http::Method;
//! use tbep_client::{RequestOptions, TbepClient, TbepResponse};
//! use tbep_common::settings::Settings;
//!
//! # fn main() -> Result<(), error_stack::Report<tbep_common::error::TbepError>> {
//! let settings = Settings::from_file("tbep.toml")?;
//! let client = TbepClient::new(&settings)?;
//!
//! let request = client.create_request(
//!     Method::GET,
//!     &["v3/partner-transfer/batches/out-batch-no", "plfk2020042013"],
//!     &RequestOptions::default(),
//! )?;
//! let response: TbepResponse<serde_json::Value> = client.send_request(request, None)?;
//! client.verify_response_signature(&response).into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod transport;

pub use client::{ApiErrorBody, RequestOptions, TbepClient, TbepRequest, TbepResponse};
pub use transport::{HttpTransport, UreqTransport};
