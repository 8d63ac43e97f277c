//! Request signing utilities for the TBEP API.
//!
//! This module provides SHA256withRSA signing of outbound requests, parsing of
//! the `TBEP-Authorization` attribute list, credential lookup by certificate
//! serial number, and verification of inbound signatures.

pub mod credentials;
pub mod header;
pub mod keys;
pub mod signing;
pub mod verification;

pub use credentials::*;
pub use header::*;
pub use keys::*;
pub use signing::*;
pub use verification::*;
