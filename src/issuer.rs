//! Credential generation, request-token issuance, and single-use verifier exchange.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, Client, ClientKey, RealmSet, RequestToken, RequestTokenState, TokenKey,
		TokenSecret,
	},
	config::{LengthBounds, ProviderConfig},
	store::{ExchangeOutcome, TimedStore},
};

/// Issues request and access tokens against the credential store.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
	store: TimedStore,
	key_length: LengthBounds,
	default_realms: RealmSet,
	request_token_ttl: Duration,
}
impl TokenIssuer {
	/// Creates an issuer that persists through `store` using the provided settings.
	pub fn new(store: TimedStore, config: &ProviderConfig) -> Self {
		Self {
			store,
			key_length: config.key_length,
			default_realms: config.default_realms.clone(),
			request_token_ttl: config.request_token_ttl(),
		}
	}

	/// Lifetime of an unexchanged request token.
	pub fn request_token_ttl(&self) -> Duration {
		self.request_token_ttl
	}

	/// Random alphanumeric string whose length falls within the configured bounds.
	pub fn generate_token(&self) -> String {
		let mut rng = rand::rng();
		let len = rng.random_range(self.key_length.min..=self.key_length.max);

		rng.sample_iter(Alphanumeric).take(len).map(char::from).collect()
	}

	/// Fresh verifier handed to the client after consent.
	pub fn generate_verifier(&self) -> TokenSecret {
		TokenSecret::new(self.generate_token())
	}

	/// Realms a client may request: its own defaults, or the provider defaults when it has none.
	pub fn permitted_realms<'a>(&'a self, client: &'a Client) -> &'a RealmSet {
		if client.default_realms.is_empty() { &self.default_realms } else { &client.default_realms }
	}

	/// Resolves the realms for a new request token.
	///
	/// An empty request receives every permitted realm; otherwise the request must be a subset of
	/// the permitted realms.
	pub fn resolve_realms(&self, client: &Client, requested: &RealmSet) -> Result<RealmSet> {
		let permitted = self.permitted_realms(client);

		if requested.is_empty() {
			Ok(permitted.clone())
		} else if requested.is_subset(permitted) {
			Ok(requested.clone())
		} else {
			Err(Error::RealmNotGranted)
		}
	}

	/// Issues and persists a request token in the `Issued` state.
	///
	/// `callback_uri` of `None` marks an out-of-band client.
	pub async fn issue_request_token(
		&self,
		client: &Client,
		requested_realms: &RealmSet,
		callback_uri: Option<Url>,
	) -> Result<RequestToken> {
		self.issue_request_token_at(client, requested_realms, callback_uri, OffsetDateTime::now_utc())
			.await
	}

	/// Same as [`issue_request_token`](Self::issue_request_token) with an explicit issuance
	/// instant.
	pub async fn issue_request_token_at(
		&self,
		client: &Client,
		requested_realms: &RealmSet,
		callback_uri: Option<Url>,
		instant: OffsetDateTime,
	) -> Result<RequestToken> {
		let realms = self.resolve_realms(client, requested_realms)?;
		let token = RequestToken {
			key: TokenKey::from_generated(self.generate_token()),
			secret: TokenSecret::new(self.generate_token()),
			client_key: client.key.clone(),
			realms,
			callback_uri,
			verifier: None,
			state: RequestTokenState::Issued,
			issued_at: instant,
		};

		self.store.save_request_token(token.clone()).await?;

		Ok(token)
	}

	/// Exchanges an authorized request token and its verifier for a new access token.
	pub async fn exchange_for_access_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
		verifier: &str,
	) -> Result<AccessToken> {
		self.exchange_for_access_token_at(client_key, token_key, verifier, OffsetDateTime::now_utc())
			.await
	}

	/// Same as [`exchange_for_access_token`](Self::exchange_for_access_token) with an explicit
	/// clock.
	pub async fn exchange_for_access_token_at(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
		verifier: &str,
		instant: OffsetDateTime,
	) -> Result<AccessToken> {
		let token = self
			.store
			.get_request_token(client_key, token_key)
			.await?
			.ok_or(Error::InvalidToken)?;
		let token = self.ensure_fresh(token, instant).await?;

		if token.state == RequestTokenState::Expired {
			return Err(Error::InvalidToken);
		}
		if token.verifier.is_none() {
			return Err(Error::TokenAlreadyExchanged);
		}
		if !token.verifier_matches(verifier) {
			return Err(Error::InvalidVerifier);
		}
		if token.state != RequestTokenState::Authorized {
			return Err(Error::TokenAlreadyExchanged);
		}

		let access_token = AccessToken {
			key: TokenKey::from_generated(self.generate_token()),
			secret: TokenSecret::new(self.generate_token()),
			client_key: client_key.clone(),
			realms: token.realms.clone(),
			issued_at: instant,
			revoked_at: None,
		};

		match self.store.exchange_request_token(client_key, token_key, access_token.clone()).await? {
			ExchangeOutcome::Exchanged => Ok(access_token),
			ExchangeOutcome::StateMismatch(RequestTokenState::Expired) | ExchangeOutcome::Missing =>
				Err(Error::InvalidToken),
			ExchangeOutcome::StateMismatch(_) => Err(Error::TokenAlreadyExchanged),
		}
	}

	/// Moves a request token that outlived its TTL to `Expired` and rejects it.
	///
	/// Tokens still within their TTL, and tokens already in a terminal state, pass through.
	pub(crate) async fn ensure_fresh(
		&self,
		token: RequestToken,
		instant: OffsetDateTime,
	) -> Result<RequestToken> {
		if !token.is_expired_at(instant, self.request_token_ttl) {
			return Ok(token);
		}

		let expired = token.with_state(RequestTokenState::Expired);

		// A concurrent transition wins; the token is unusable for this caller either way.
		self.store
			.transition_request_token(&token.client_key, &token.key, &[token.state], expired)
			.await?;

		Err(Error::InvalidToken)
	}
}
