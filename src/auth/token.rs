//! Request-token, access-token, and secret models.

pub mod access;
pub mod request;
pub mod secret;
