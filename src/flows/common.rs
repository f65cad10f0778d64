//! Shared flow types plus the outcome bookkeeping every entry point goes through.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenKey, TokenSecret},
	obs::{self, FlowKind, FlowOutcome},
	provider::Provider,
};

/// What the host framework should send back for a flow call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowResponse {
	/// `200 OK` with an `application/x-www-form-urlencoded` body.
	Body(String),
	/// `302 Found` to the contained location.
	Redirect(Url),
	/// Consent granted to an out-of-band client; show the verifier to the resource owner.
	OutOfBand {
		/// Authorized request token.
		token: TokenKey,
		/// Verifier the resource owner types into the client.
		verifier: TokenSecret,
	},
	/// Rejected with nowhere to redirect to; render the code as an error page.
	Rejected {
		/// Stable error code (see [`Error::error_code`]).
		error: &'static str,
	},
}
impl FlowResponse {
	/// Form-encoded body, if this is a [`FlowResponse::Body`].
	pub fn body(&self) -> Option<&str> {
		match self {
			FlowResponse::Body(body) => Some(body),
			_ => None,
		}
	}

	/// Decoded body parameters, empty for non-body responses.
	pub fn body_params(&self) -> HashMap<String, String> {
		self.body()
			.map(|body| form_urlencoded::parse(body.as_bytes()).into_owned().collect())
			.unwrap_or_default()
	}

	/// Redirect location, if this is a [`FlowResponse::Redirect`].
	pub fn location(&self) -> Option<&Url> {
		match self {
			FlowResponse::Redirect(url) => Some(url),
			_ => None,
		}
	}

	/// `error` code carried by a rejection or an error redirect.
	pub fn error(&self) -> Option<String> {
		match self {
			FlowResponse::Rejected { error } => Some((*error).to_owned()),
			FlowResponse::Redirect(url) =>
				url.query_pairs().find(|(k, _)| k == "error").map(|(_, v)| v.into_owned()),
			_ => None,
		}
	}
}

/// Read-only view of a pending request token, surfaced on the consent screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationDetails {
	/// Client asking for access.
	pub client_key: ClientKey,
	/// Realms the client asked for.
	pub realms: RealmSet,
	/// Where the resource owner returns to; `None` for out-of-band clients.
	pub callback: Option<Url>,
}

/// Resource owner's answer on the consent screen.
#[derive(Clone, Debug)]
pub struct ConsentDecision {
	/// Request token being decided on.
	pub token_key: TokenKey,
	/// Whether access was granted.
	pub approved: bool,
	/// Narrower realm set chosen by the resource owner; defaults to everything requested.
	pub realms: Option<RealmSet>,
	/// Caller-supplied error redirect target.
	pub redirect_uri: Option<String>,
}
impl ConsentDecision {
	/// Grants every requested realm.
	pub fn approve(token_key: TokenKey) -> Self {
		Self { token_key, approved: true, realms: None, redirect_uri: None }
	}

	/// Denies access.
	pub fn deny(token_key: TokenKey) -> Self {
		Self { token_key, approved: false, realms: None, redirect_uri: None }
	}

	/// Grants only `realms`, which must be a subset of those requested.
	pub fn with_realms(mut self, realms: RealmSet) -> Self {
		self.realms = Some(realms);

		self
	}

	/// Sets the error redirect target.
	pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(uri.into());

		self
	}
}

/// Appends `pairs` to a copy of `base`.
pub fn with_query(base: &Url, pairs: &[(&str, &str)]) -> Url {
	let mut url = base.clone();

	url.query_pairs_mut().extend_pairs(pairs);

	url
}

/// Form-encodes a response body.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
	form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}

impl Provider {
	/// Records the outcome of a flow call and turns validation failures into error responses.
	///
	/// Only [`Error::StoreUnavailable`] escapes as `Err`.
	pub(crate) fn finish_flow(
		&self,
		kind: FlowKind,
		redirect_uri: Option<&str>,
		result: Result<FlowResponse>,
	) -> Result<FlowResponse> {
		match result {
			Ok(response) => {
				obs::record_flow_outcome(kind, FlowOutcome::Success);

				Ok(response)
			},
			Err(e) => {
				obs::record_rejection(kind, &e);
				obs::record_flow_outcome(kind, FlowOutcome::Failure);

				if e.is_retryable() { Err(e) } else { Ok(self.error_response(redirect_uri, &e)) }
			},
		}
	}

	/// Error redirect to the caller-supplied URI, else the configured error URI; a rejection
	/// when neither parses.
	pub fn error_response(&self, redirect_uri: Option<&str>, error: &Error) -> FlowResponse {
		let target = redirect_uri
			.and_then(|raw| Url::parse(raw).ok())
			.or_else(|| self.config().error_uri.clone());

		match target {
			Some(url) => FlowResponse::Redirect(with_query(&url, &[("error", error.error_code())])),
			None => FlowResponse::Rejected { error: error.error_code() },
		}
	}
}
