// self
use crate::{
	_prelude::*,
	auth::Client,
	flows::common::{self, FlowResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Provider,
	request::{OUT_OF_BAND, SignedRequest},
};

const STANDARD_FIELDS: [&str; 3] =
	["oauth_token", "oauth_token_secret", "oauth_callback_confirmed"];

impl Provider {
	/// Handles a request-token call signed with client credentials only.
	///
	/// The call must carry `oauth_callback`, either a registered URI or `oob`. Success yields
	/// `oauth_token=…&oauth_token_secret=…&oauth_callback_confirmed=true`.
	pub async fn request_token(&self, request: &SignedRequest) -> Result<FlowResponse> {
		self.request_token_with(request, &[]).await
	}

	/// Like [`Provider::request_token`], appending `extra` pairs to a successful body.
	///
	/// Pairs named like one of the standard response fields are dropped.
	pub async fn request_token_with(
		&self,
		request: &SignedRequest,
		extra: &[(&str, &str)],
	) -> Result<FlowResponse> {
		const KIND: FlowKind = FlowKind::RequestToken;

		let span = FlowSpan::new(KIND, "request_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.issue_from_request(request, extra)).await;
		let redirect_uri = request.param("redirect_uri");

		self.finish_flow(KIND, redirect_uri.as_deref(), result)
	}

	async fn issue_from_request(
		&self,
		request: &SignedRequest,
		extra: &[(&str, &str)],
	) -> Result<FlowResponse> {
		self.ensure_transport(request)?;

		let params = request.oauth_params()?;

		if params.token.is_some() {
			return Err(Error::invalid_request("request-token calls must not carry oauth_token"));
		}

		let callback = params
			.callback
			.as_deref()
			.ok_or_else(|| Error::invalid_request("missing oauth_callback"))?;
		let client = self.load_client(request, &params).await?;

		self.verify_signed(request, &params, &client, None)?;

		let callback = resolve_callback(&client, Some(callback))?;
		let realms = request.realms()?;
		let token = self.issuer().issue_request_token(&client, &realms, callback).await?;
		let mut body = vec![
			("oauth_token", token.key.as_ref()),
			("oauth_token_secret", token.secret.expose()),
			("oauth_callback_confirmed", "true"),
		];

		body.extend(extra.iter().copied().filter(|(name, _)| !STANDARD_FIELDS.contains(name)));

		Ok(FlowResponse::Body(common::form_body(&body)))
	}
}

/// Resolves `oauth_callback` for a client.
///
/// `oob` yields `None`. A supplied URI must be registered. A missing callback falls back to the
/// client's first registered URI, or to out-of-band when it has none.
pub fn resolve_callback(client: &Client, callback: Option<&str>) -> Result<Option<Url>> {
	match callback {
		Some(OUT_OF_BAND) => Ok(None),
		Some(raw) if client.validate_redirect_uri(Some(raw)) =>
			Url::parse(raw).map(Some).map_err(|_| Error::InvalidRedirectUri),
		Some(_) => Err(Error::InvalidRedirectUri),
		None if client.validate_redirect_uri(None) => Ok(None),
		None => Ok(client.default_redirect_uri().cloned()),
	}
}
