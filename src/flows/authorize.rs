// self
use crate::{
	_prelude::*,
	auth::{RequestToken, RequestTokenState, TokenKey},
	flows::common::{self, AuthorizationDetails, ConsentDecision, FlowResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Provider,
	store::TransitionOutcome,
};

impl Provider {
	/// Loads what the consent screen needs and moves the token to `AwaitingConsent`.
	pub async fn authorization_details(&self, token_key: &TokenKey) -> Result<AuthorizationDetails> {
		const KIND: FlowKind = FlowKind::Authorization;

		let span = FlowSpan::new(KIND, "authorization_details");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.present_for_consent(token_key)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				obs::record_rejection(KIND, e);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Applies the resource owner's decision.
	///
	/// Approval binds a fresh verifier and redirects to the callback with `oauth_token` and
	/// `oauth_verifier`; out-of-band clients get [`FlowResponse::OutOfBand`] instead. Denial
	/// redirects to the callback (or the configured error URI) with `error=denied`.
	///
	/// A token still in `Issued` may be decided directly; calling
	/// [`Provider::authorization_details`] first is optional.
	pub async fn authorize(&self, decision: ConsentDecision) -> Result<FlowResponse> {
		const KIND: FlowKind = FlowKind::Authorization;

		let span = FlowSpan::new(KIND, "authorize");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.decide(&decision)).await;

		self.finish_flow(KIND, decision.redirect_uri.as_deref(), result)
	}

	async fn present_for_consent(&self, token_key: &TokenKey) -> Result<AuthorizationDetails> {
		let token = self.pending_request_token(token_key).await?;

		if token.state == RequestTokenState::Issued {
			let awaiting = token.with_state(RequestTokenState::AwaitingConsent);

			match self
				.store()
				.transition_request_token(
					&token.client_key,
					&token.key,
					&[RequestTokenState::Issued],
					awaiting,
				)
				.await?
			{
				TransitionOutcome::Updated
				| TransitionOutcome::StateMismatch(RequestTokenState::AwaitingConsent) => (),
				_ => return Err(Error::InvalidToken),
			}
		}

		Ok(AuthorizationDetails {
			client_key: token.client_key,
			realms: token.realms,
			callback: token.callback_uri,
		})
	}

	async fn decide(&self, decision: &ConsentDecision) -> Result<FlowResponse> {
		let token = self.pending_request_token(&decision.token_key).await?;

		if decision.approved { self.approve(token, decision).await } else { self.deny(token).await }
	}

	async fn approve(&self, token: RequestToken, decision: &ConsentDecision) -> Result<FlowResponse> {
		let realms = match &decision.realms {
			Some(realms) if realms.is_subset(&token.realms) => realms.clone(),
			Some(_) => return Err(Error::RealmNotGranted),
			None => token.realms.clone(),
		};
		let verifier = self.issuer().generate_verifier();
		let authorized = token.authorized(verifier.clone(), realms);

		self.consent_transition(&token, authorized).await?;

		match &token.callback_uri {
			Some(callback) => Ok(FlowResponse::Redirect(common::with_query(
				callback,
				&[("oauth_token", token.key.as_ref()), ("oauth_verifier", verifier.expose())],
			))),
			None => Ok(FlowResponse::OutOfBand { token: token.key, verifier }),
		}
	}

	async fn deny(&self, token: RequestToken) -> Result<FlowResponse> {
		let denied = token.with_state(RequestTokenState::Denied);

		self.consent_transition(&token, denied).await?;

		match token.callback_uri.as_ref().or(self.config().error_uri.as_ref()) {
			Some(target) =>
				Ok(FlowResponse::Redirect(common::with_query(target, &[("error", "denied")]))),
			None => Ok(FlowResponse::Rejected { error: "denied" }),
		}
	}

	async fn consent_transition(&self, token: &RequestToken, replacement: RequestToken) -> Result<()> {
		match self
			.store()
			.transition_request_token(
				&token.client_key,
				&token.key,
				&RequestTokenState::CONSENTABLE,
				replacement,
			)
			.await?
		{
			TransitionOutcome::Updated => Ok(()),
			TransitionOutcome::StateMismatch(_) | TransitionOutcome::Missing =>
				Err(Error::InvalidToken),
		}
	}

	/// Fetches a request token that can still be consented to.
	async fn pending_request_token(&self, token_key: &TokenKey) -> Result<RequestToken> {
		let token = self.store().find_request_token(token_key).await?.ok_or(Error::InvalidToken)?;
		let token = self.issuer().ensure_fresh(token, OffsetDateTime::now_utc()).await?;

		if RequestTokenState::CONSENTABLE.contains(&token.state) {
			Ok(token)
		} else {
			Err(Error::InvalidToken)
		}
	}
}
