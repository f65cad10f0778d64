//! Request-token model and its lifecycle states.

// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenKey, TokenSecret},
};

/// Lifecycle state of a request token.
///
/// `Issued → AwaitingConsent → (Authorized | Denied)`, `Authorized → Exchanged`, and any
/// non-terminal state may move to `Expired` once the request-token TTL elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestTokenState {
	/// Freshly issued to the client.
	Issued,
	/// Surfaced to the resource owner for consent.
	AwaitingConsent,
	/// Approved by the resource owner; a verifier is bound.
	Authorized,
	/// Rejected by the resource owner.
	Denied,
	/// Exchanged for an access token.
	Exchanged,
	/// Outlived the request-token TTL.
	Expired,
}
impl RequestTokenState {
	/// States from which the resource owner may still grant or deny consent.
	pub const CONSENTABLE: [RequestTokenState; 2] =
		[RequestTokenState::Issued, RequestTokenState::AwaitingConsent];

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestTokenState::Issued => "issued",
			RequestTokenState::AwaitingConsent => "awaiting_consent",
			RequestTokenState::Authorized => "authorized",
			RequestTokenState::Denied => "denied",
			RequestTokenState::Exchanged => "exchanged",
			RequestTokenState::Expired => "expired",
		}
	}

	/// Returns `true` when no further transition is possible.
	pub const fn is_terminal(self) -> bool {
		matches!(
			self,
			RequestTokenState::Denied | RequestTokenState::Exchanged | RequestTokenState::Expired
		)
	}
}
impl Display for RequestTokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Short-lived credential carrying a client through the consent step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestToken {
	/// Public token key (`oauth_token`).
	pub key: TokenKey,
	/// Token secret shared with the client at issuance.
	pub secret: TokenSecret,
	/// Client the token was issued to.
	pub client_key: ClientKey,
	/// Realms requested (and validated) at issuance.
	pub realms: RealmSet,
	/// Callback the resource owner returns to; `None` for out-of-band (`oob`) clients.
	pub callback_uri: Option<Url>,
	/// Verifier bound on approval.
	pub verifier: Option<TokenSecret>,
	/// Current lifecycle state.
	pub state: RequestTokenState,
	/// Issuance instant, used for TTL expiry.
	pub issued_at: OffsetDateTime,
}
impl RequestToken {
	/// Returns `true` if the token outlived `ttl` at `instant` while still in a non-terminal state.
	///
	/// A deadline past the representable range never elapses.
	pub fn is_expired_at(&self, instant: OffsetDateTime, ttl: Duration) -> bool {
		!self.state.is_terminal()
			&& self.issued_at.checked_add(ttl).is_some_and(|deadline| instant >= deadline)
	}

	/// Returns a copy moved to `state`.
	pub fn with_state(&self, state: RequestTokenState) -> Self {
		Self { state, ..self.clone() }
	}

	/// Returns a copy in the authorized state with `verifier` bound and realms narrowed to
	/// `realms`.
	pub fn authorized(&self, verifier: TokenSecret, realms: RealmSet) -> Self {
		Self {
			verifier: Some(verifier),
			realms,
			state: RequestTokenState::Authorized,
			..self.clone()
		}
	}

	/// Checks a presented verifier in constant time; tokens without a verifier never match.
	pub fn verifier_matches(&self, presented: &str) -> bool {
		self.verifier.as_ref().is_some_and(|verifier| verifier.matches(presented))
	}
}
