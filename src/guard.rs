//! Protected-resource verification.
//!
//! [`RequestGuard::verify`] runs the checks in a fixed order and stops at the first failure:
//!
//! 1. the access token exists and is not revoked (its secret is needed for the signature),
//! 2. the signature verifies against the client and token secrets,
//! 3. the nonce and timestamp are accepted,
//! 4. the required realms are a subset of the realms granted to the token.
//!
//! An unknown client or token still pays for a signature check against placeholder secrets, so
//! rejection time does not reveal which keys exist.
//!
//! Denials carry no detail for the caller; the reason is kept for diagnostics only.

pub mod middleware;

pub use middleware::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenKey},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Provider,
	request::SignedRequest,
};

/// Caller identity established by a successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
	/// Client that signed the request.
	pub client_key: ClientKey,
	/// Access token presented.
	pub token_key: TokenKey,
	/// Realms granted to the token.
	pub realms: RealmSet,
}

/// Result of a guard check.
#[derive(Debug)]
pub struct Verification {
	outcome: Result<Identity, Error>,
}
impl Verification {
	fn allowed(identity: Identity) -> Self {
		Self { outcome: Ok(identity) }
	}

	fn denied(reason: Error) -> Self {
		Self { outcome: Err(reason) }
	}

	/// Returns `true` when the request may proceed.
	pub fn is_ok(&self) -> bool {
		self.outcome.is_ok()
	}

	/// Verified identity, if allowed.
	pub fn identity(&self) -> Option<&Identity> {
		self.outcome.as_ref().ok()
	}

	/// Why the request was denied. For logs and diagnostics only; never send it to the client.
	pub fn denial_reason(&self) -> Option<&Error> {
		self.outcome.as_ref().err()
	}

	/// Consumes the verification, yielding the identity if allowed.
	pub fn into_identity(self) -> Option<Identity> {
		self.outcome.ok()
	}
}

/// Verifies signed calls to protected resources.
#[derive(Clone, Debug)]
pub struct RequestGuard {
	provider: Provider,
}
impl RequestGuard {
	/// Creates a guard backed by `provider`.
	pub fn new(provider: Provider) -> Self {
		Self { provider }
	}

	/// Checks `request` and requires every realm in `required_realms`.
	///
	/// Every validation failure becomes a denied [`Verification`]; only
	/// [`Error::StoreUnavailable`] is returned as `Err`.
	pub async fn verify(
		&self,
		request: &SignedRequest,
		required_realms: &RealmSet,
	) -> Result<Verification> {
		const KIND: FlowKind = FlowKind::ProtectedResource;

		let span = FlowSpan::new(KIND, "verify");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match span.instrument(self.check(request, required_realms)).await {
			Ok(identity) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(Verification::allowed(identity))
			},
			Err(e) => {
				obs::record_rejection(KIND, &e);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				if e.is_retryable() { Err(e) } else { Ok(Verification::denied(e)) }
			},
		}
	}

	async fn check(&self, request: &SignedRequest, required_realms: &RealmSet) -> Result<Identity> {
		let provider = &self.provider;

		provider.ensure_transport(request)?;

		let params = request.oauth_params()?;
		let token_key = params.token.clone().ok_or(Error::InvalidToken)?;
		let client = provider.load_client(request, &params).await?;
		let Some(access_token) = provider
			.store()
			.get_access_token(&client.key, &token_key)
			.await?
			.filter(|token| !token.is_revoked())
		else {
			provider.verify_placeholder(request, &params, Some(&client));

			return Err(Error::InvalidToken);
		};

		provider.verify_signed(request, &params, &client, Some(access_token.secret.expose()))?;

		if !access_token.grants(required_realms) {
			return Err(Error::RealmNotGranted);
		}

		Ok(Identity { client_key: client.key, token_key, realms: access_token.realms })
	}
}

impl Provider {
	/// Guard sharing this provider's store, validator, and replay cache.
	pub fn guard(&self) -> RequestGuard {
		RequestGuard::new(self.clone())
	}

	/// Shorthand for [`RequestGuard::verify`].
	pub async fn verify_request(
		&self,
		request: &SignedRequest,
		required_realms: &RealmSet,
	) -> Result<Verification> {
		self.guard().verify(request, required_realms).await
	}
}
