//! Three-legged authorization flow: request-token issuance, consent, and verifier exchange.
//!
//! Each entry point is a method on [`Provider`](crate::provider::Provider). Validation failures
//! come back as [`FlowResponse`] error redirects so the host framework never has to map errors
//! itself; only [`Error::StoreUnavailable`](crate::error::Error::StoreUnavailable) surfaces as
//! `Err`, signalling that the client may retry.

pub mod common;

mod access_token;
mod authorize;
mod request_token;

pub use common::*;
pub use request_token::resolve_callback;
