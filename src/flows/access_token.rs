// self
use crate::{
	_prelude::*,
	flows::common::{self, FlowResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Provider,
	request::SignedRequest,
};

impl Provider {
	/// Handles an access-token call signed with the client secret and the request-token secret.
	///
	/// Success yields `oauth_token=…&oauth_token_secret=…`.
	pub async fn access_token(&self, request: &SignedRequest) -> Result<FlowResponse> {
		const KIND: FlowKind = FlowKind::AccessToken;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_from_request(request)).await;
		let redirect_uri = request.param("redirect_uri");

		self.finish_flow(KIND, redirect_uri.as_deref(), result)
	}

	async fn exchange_from_request(&self, request: &SignedRequest) -> Result<FlowResponse> {
		self.ensure_transport(request)?;

		let params = request.oauth_params()?;
		let token_key =
			params.token.clone().ok_or_else(|| Error::invalid_request("missing oauth_token"))?;
		let verifier = params
			.verifier
			.clone()
			.ok_or_else(|| Error::invalid_request("missing oauth_verifier"))?;
		let client = self.load_client(request, &params).await?;
		let Some(request_token) = self.store().get_request_token(&client.key, &token_key).await?
		else {
			self.verify_placeholder(request, &params, Some(&client));

			return Err(Error::InvalidToken);
		};

		self.verify_signed(request, &params, &client, Some(request_token.secret.expose()))?;

		let access_token =
			self.issuer().exchange_for_access_token(&client.key, &token_key, &verifier).await?;

		Ok(FlowResponse::Body(common::form_body(&[
			("oauth_token", access_token.key.as_ref()),
			("oauth_token_secret", access_token.secret.expose()),
		])))
	}
}
