//! Signature base string construction (RFC 5849 §3.4.1).

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::_prelude::*;

/// Everything except the RFC 3986 unreserved characters.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a value with the RFC 3986 unreserved set used throughout OAuth 1.0.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, RFC3986).to_string()
}

/// Base string URI: lowercase scheme and host, default ports dropped, query and fragment
/// removed.
pub fn normalize_url(url: &Url) -> String {
	let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
	let port = url.port().map(|port| format!(":{port}")).unwrap_or_default();

	format!("{}://{host}{port}{}", url.scheme(), url.path())
}

/// Normalized request parameters: encoded, sorted by name then value, joined with `&`.
///
/// `oauth_signature` never participates in its own base string and is skipped.
pub fn normalize_parameters(params: &[(String, String)]) -> String {
	let mut encoded: Vec<(String, String)> = params
		.iter()
		.filter(|(name, _)| name != "oauth_signature")
		.map(|(name, value)| (percent_encode(name), percent_encode(value)))
		.collect();

	encoded.sort();
	encoded.into_iter().map(|(name, value)| format!("{name}={value}")).collect::<Vec<_>>().join("&")
}

/// Full base string: `METHOD&encoded-url&encoded-parameters`.
pub fn base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(&normalize_url(url)),
		percent_encode(&normalize_parameters(params))
	)
}
