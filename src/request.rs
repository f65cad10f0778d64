//! Framework-independent view of an inbound signed request.
//!
//! The host framework copies the HTTP method, full request URL, any
//! `application/x-www-form-urlencoded` body, and the `Authorization` header into a
//! [`SignedRequest`]; everything else in the provider works off this value.

// crates.io
use percent_encoding::percent_decode_str;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenKey},
};

/// Protocol version accepted in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";
/// Callback value used by clients that cannot receive redirects.
pub const OUT_OF_BAND: &str = "oob";

const AUTHORIZATION_SCHEME: &str = "OAuth";

/// Signed HTTP request as seen by the provider.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// HTTP method, e.g. `GET` or `POST`.
	pub method: String,
	/// Absolute request URL including the query string.
	pub url: Url,
	/// Decoded `application/x-www-form-urlencoded` body parameters.
	pub body_params: Vec<(String, String)>,
	/// Raw `Authorization` header value, if present.
	pub authorization: Option<String>,
}
impl SignedRequest {
	/// Creates a request without body parameters or authorization header.
	pub fn new(method: impl Into<String>, url: Url) -> Self {
		Self { method: method.into(), url, body_params: Vec::new(), authorization: None }
	}

	/// Parses and attaches a form-encoded body.
	pub fn with_form_body(mut self, body: &str) -> Self {
		self.body_params = form_urlencoded::parse(body.as_bytes()).into_owned().collect();

		self
	}

	/// Attaches a single body parameter.
	pub fn with_body_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.body_params.push((name.into(), value.into()));

		self
	}

	/// Attaches the raw `Authorization` header value.
	pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
		self.authorization = Some(header.into());

		self
	}

	/// Returns `true` when the request arrived over HTTPS.
	pub fn is_secure(&self) -> bool {
		self.url.scheme() == "https"
	}

	/// First query or body parameter named `name`.
	pub fn param(&self, name: &str) -> Option<String> {
		self.url
			.query_pairs()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.into_owned())
			.or_else(|| self.body_params.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()))
	}

	/// Realms requested through the `realm` authorization-header parameter.
	pub fn realms(&self) -> Result<RealmSet> {
		let header = self.header_params()?;

		match header.iter().find(|(k, _)| k == "realm") {
			Some((_, value)) => RealmSet::from_str(value)
				.map_err(|e| Error::invalid_request(format!("realm parameter is invalid: {e}"))),
			None => Ok(RealmSet::default()),
		}
	}

	/// Decoded `Authorization: OAuth` header parameters, including `realm`.
	pub fn header_params(&self) -> Result<Vec<(String, String)>> {
		match self.authorization.as_deref() {
			Some(header) => parse_authorization_header(header),
			None => Ok(Vec::new()),
		}
	}

	/// Every parameter that participates in the signature base string.
	///
	/// Query, body, and header parameters are merged; the header `realm` is excluded as
	/// required by RFC 5849 §3.4.1.3.1. `oauth_signature` is kept so callers can locate it.
	pub fn parameters(&self) -> Result<Vec<(String, String)>> {
		let mut params: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();

		params.extend(self.body_params.iter().cloned());
		params.extend(self.header_params()?.into_iter().filter(|(k, _)| k != "realm"));

		Ok(params)
	}

	/// Extracts and validates the protocol parameters.
	pub fn oauth_params(&self) -> Result<OAuthParams> {
		let params = self.parameters()?;
		let mut oauth: BTreeMap<&str, &str> = BTreeMap::new();

		for (name, value) in params.iter().filter(|(k, _)| k.starts_with("oauth_")) {
			if oauth.insert(name.as_str(), value.as_str()).is_some() {
				return Err(Error::invalid_request(format!("duplicate parameter {name}")));
			}
		}

		let required = |name: &str| {
			oauth
				.get(name)
				.filter(|value| !value.is_empty())
				.map(|value| value.to_string())
				.ok_or_else(|| Error::invalid_request(format!("missing parameter {name}")))
		};
		let consumer_key = ClientKey::new(required("oauth_consumer_key")?)
			.map_err(|_| Error::InvalidClient)?;
		let signature_method = required("oauth_signature_method")?;
		let signature = required("oauth_signature")?;
		let nonce = required("oauth_nonce")?;
		let timestamp = required("oauth_timestamp")?
			.parse::<i64>()
			.map_err(|_| Error::invalid_request("oauth_timestamp must be an integer"))?;
		let token = match oauth.get("oauth_token") {
			Some(value) if !value.is_empty() =>
				Some(TokenKey::new(*value).map_err(|_| Error::InvalidToken)?),
			_ => None,
		};
		let version = oauth.get("oauth_version").map(|v| v.to_string());

		if version.as_deref().is_some_and(|v| v != OAUTH_VERSION) {
			return Err(Error::invalid_request("unsupported oauth_version"));
		}

		Ok(OAuthParams {
			consumer_key,
			token,
			signature_method,
			signature,
			timestamp,
			nonce,
			version,
			callback: oauth.get("oauth_callback").map(|v| v.to_string()),
			verifier: oauth.get("oauth_verifier").map(|v| v.to_string()),
		})
	}
}

/// Protocol parameters carried by a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthParams {
	/// `oauth_consumer_key`.
	pub consumer_key: ClientKey,
	/// `oauth_token`, absent on request-token calls.
	pub token: Option<TokenKey>,
	/// `oauth_signature_method` as sent.
	pub signature_method: String,
	/// `oauth_signature`, percent-decoded.
	pub signature: String,
	/// `oauth_timestamp` in Unix seconds.
	pub timestamp: i64,
	/// `oauth_nonce`.
	pub nonce: String,
	/// `oauth_version`, if sent (always `1.0` after validation).
	pub version: Option<String>,
	/// `oauth_callback`, present on request-token calls.
	pub callback: Option<String>,
	/// `oauth_verifier`, present on access-token calls.
	pub verifier: Option<String>,
}

/// Parses an `Authorization: OAuth k="v", ...` header value (RFC 5849 §3.5.1).
pub fn parse_authorization_header(header: &str) -> Result<Vec<(String, String)>> {
	let header = header.trim();
	let rest = header
		.get(..AUTHORIZATION_SCHEME.len())
		.filter(|scheme| scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME))
		.map(|_| &header[AUTHORIZATION_SCHEME.len()..])
		.ok_or_else(|| Error::invalid_request("authorization header is not an OAuth header"))?;
	let mut params = Vec::new();

	for item in rest.split(',').map(str::trim).filter(|item| !item.is_empty()) {
		let (name, quoted) = item
			.split_once('=')
			.ok_or_else(|| Error::invalid_request("malformed authorization parameter"))?;
		let value = quoted
			.trim()
			.strip_prefix('"')
			.and_then(|v| v.strip_suffix('"'))
			.ok_or_else(|| Error::invalid_request("authorization values must be quoted"))?;

		params.push((decode(name.trim())?, decode(value)?));
	}

	Ok(params)
}

fn decode(raw: &str) -> Result<String> {
	percent_decode_str(raw)
		.decode_utf8()
		.map(|value| value.into_owned())
		.map_err(|_| Error::invalid_request("parameter is not valid UTF-8"))
}
