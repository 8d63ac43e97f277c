//! Common functionality for the TBEP SDK.
//!
//! This crate holds everything that does not touch the network: signing and
//! verification, credentials, header codecs, settings and logging. The HTTP
//! client in `tbep-client` and the `tbepcli` tool build on it.
//!
//! # Modules
//!
//! - [`constants`]: Header names, algorithm names and defaults
//! - [`encryption`]: `TBEP-Encrypt` header metadata
//! - [`error`]: Error types
//! - [`logging`]: Logger initialization
//! - [`request_signing`]: Signature Builder, Header Codec, Credential Set and
//!   Verification Orchestrator
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Test fixtures (tests and the `test-support` feature only)

pub mod constants;
pub mod encryption;
pub mod error;
pub mod logging;
pub mod request_signing;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
