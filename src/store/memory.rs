//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Client, ClientKey, RequestToken, RequestTokenState, TokenKey},
	store::{CredentialStore, ExchangeOutcome, StoreFuture, TransitionOutcome},
};

type StoreState = Arc<RwLock<MemoryState>>;

#[derive(Debug, Default)]
struct MemoryState {
	clients: HashMap<ClientKey, Client>,
	request_tokens: HashMap<TokenKey, RequestToken>,
	access_tokens: HashMap<TokenKey, AccessToken>,
}

/// Storage backend that keeps clients and tokens in-process for tests and demos.
///
/// One lock guards every map so exchanges update the request token and insert the access token
/// in the same critical section.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreState);
impl MemoryStore {
	/// Registers (or replaces) a client.
	pub fn insert_client(&self, client: Client) {
		self.0.write().clients.insert(client.key.clone(), client);
	}

	/// Number of request tokens currently held.
	pub fn request_token_count(&self) -> usize {
		self.0.read().request_tokens.len()
	}

	/// Number of access tokens currently held.
	pub fn access_token_count(&self) -> usize {
		self.0.read().access_tokens.len()
	}

	fn request_token_now(
		state: StoreState,
		client_key: ClientKey,
		token_key: TokenKey,
	) -> Option<RequestToken> {
		state.read().request_tokens.get(&token_key).filter(|t| t.client_key == client_key).cloned()
	}

	fn access_token_now(
		state: StoreState,
		client_key: ClientKey,
		token_key: TokenKey,
	) -> Option<AccessToken> {
		state.read().access_tokens.get(&token_key).filter(|t| t.client_key == client_key).cloned()
	}

	fn transition_now(
		state: StoreState,
		client_key: ClientKey,
		token_key: TokenKey,
		expected: &[RequestTokenState],
		replacement: RequestToken,
	) -> TransitionOutcome {
		let mut guard = state.write();

		match guard.request_tokens.get_mut(&token_key) {
			Some(current) if current.client_key == client_key =>
				if expected.contains(&current.state) {
					*current = replacement;

					TransitionOutcome::Updated
				} else {
					TransitionOutcome::StateMismatch(current.state)
				},
			_ => TransitionOutcome::Missing,
		}
	}

	fn exchange_now(
		state: StoreState,
		client_key: ClientKey,
		token_key: TokenKey,
		access_token: AccessToken,
	) -> ExchangeOutcome {
		let mut guard = state.write();
		let outcome = match guard.request_tokens.get_mut(&token_key) {
			Some(current) if current.client_key == client_key =>
				if current.state == RequestTokenState::Authorized {
					current.state = RequestTokenState::Exchanged;

					ExchangeOutcome::Exchanged
				} else {
					ExchangeOutcome::StateMismatch(current.state)
				},
			_ => ExchangeOutcome::Missing,
		};

		if matches!(outcome, ExchangeOutcome::Exchanged) {
			guard.access_tokens.insert(access_token.key.clone(), access_token);
		}

		outcome
	}

	fn revoke_now(
		state: StoreState,
		client_key: ClientKey,
		token_key: TokenKey,
		instant: OffsetDateTime,
	) -> Option<AccessToken> {
		let mut guard = state.write();

		match guard.access_tokens.get_mut(&token_key) {
			Some(token) if token.client_key == client_key => {
				token.revoke(instant);

				Some(token.clone())
			},
			_ => None,
		}
	}
}
impl CredentialStore for MemoryStore {
	fn get_client<'a>(&'a self, client_key: &'a ClientKey) -> StoreFuture<'a, Option<Client>> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();

		Box::pin(async move { Ok(state.read().clients.get(&client_key).cloned()) })
	}

	fn get_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<RequestToken>> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();
		let token_key = token_key.to_owned();

		Box::pin(async move { Ok(Self::request_token_now(state, client_key, token_key)) })
	}

	fn find_request_token<'a>(
		&'a self,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<RequestToken>> {
		let state = self.0.clone();
		let token_key = token_key.to_owned();

		Box::pin(async move { Ok(state.read().request_tokens.get(&token_key).cloned()) })
	}

	fn get_access_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<AccessToken>> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();
		let token_key = token_key.to_owned();

		Box::pin(async move { Ok(Self::access_token_now(state, client_key, token_key)) })
	}

	fn save_request_token(&self, token: RequestToken) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().request_tokens.insert(token.key.clone(), token);

			Ok(())
		})
	}

	fn save_access_token(&self, token: AccessToken) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().access_tokens.insert(token.key.clone(), token);

			Ok(())
		})
	}

	fn transition_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		expected: &'a [RequestTokenState],
		replacement: RequestToken,
	) -> StoreFuture<'a, TransitionOutcome> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();
		let token_key = token_key.to_owned();

		Box::pin(async move {
			Ok(Self::transition_now(state, client_key, token_key, expected, replacement))
		})
	}

	fn exchange_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		access_token: AccessToken,
	) -> StoreFuture<'a, ExchangeOutcome> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();
		let token_key = token_key.to_owned();

		Box::pin(async move { Ok(Self::exchange_now(state, client_key, token_key, access_token)) })
	}

	fn revoke_access_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<AccessToken>> {
		let state = self.0.clone();
		let client_key = client_key.to_owned();
		let token_key = token_key.to_owned();

		Box::pin(async move { Ok(Self::revoke_now(state, client_key, token_key, instant)) })
	}
}
