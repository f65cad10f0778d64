//! Credential storage contract, the timeout-enforcing handle the provider calls through, and the
//! in-memory reference store.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Client, ClientKey, RequestToken, RequestTokenState, TokenKey},
};

/// Boxed future returned by every [`CredentialStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by the host application.
///
/// Lookups report absence as `Ok(None)`; errors are reserved for backend faults. Implementations
/// must synchronize internally so that [`transition_request_token`] and
/// [`exchange_request_token`] are atomic with respect to concurrent callers.
///
/// [`transition_request_token`]: CredentialStore::transition_request_token
/// [`exchange_request_token`]: CredentialStore::exchange_request_token
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches a registered client.
	fn get_client<'a>(&'a self, client_key: &'a ClientKey) -> StoreFuture<'a, Option<Client>>;

	/// Fetches a request token issued to `client_key`.
	fn get_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<RequestToken>>;

	/// Fetches a request token by key alone, as the authorization endpoint only sees
	/// `oauth_token`.
	fn find_request_token<'a>(
		&'a self,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<RequestToken>>;

	/// Fetches an access token issued to `client_key`.
	fn get_access_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
	) -> StoreFuture<'a, Option<AccessToken>>;

	/// Persists a newly issued request token.
	fn save_request_token(&self, token: RequestToken) -> StoreFuture<'_, ()>;

	/// Persists an access token.
	fn save_access_token(&self, token: AccessToken) -> StoreFuture<'_, ()>;

	/// Atomically replaces a request token if its current state is one of `expected`.
	fn transition_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		expected: &'a [RequestTokenState],
		replacement: RequestToken,
	) -> StoreFuture<'a, TransitionOutcome>;

	/// Atomically marks an authorized request token as exchanged and persists `access_token`.
	///
	/// Nothing is written unless the request token is currently
	/// [`RequestTokenState::Authorized`].
	fn exchange_request_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		access_token: AccessToken,
	) -> StoreFuture<'a, ExchangeOutcome>;

	/// Marks an access token as revoked at the provided instant.
	fn revoke_access_token<'a>(
		&'a self,
		client_key: &'a ClientKey,
		token_key: &'a TokenKey,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<AccessToken>>;
}

/// Result of a request-token state compare-and-swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
	/// The state matched and the token was replaced.
	Updated,
	/// The token exists but was in the contained state.
	StateMismatch(RequestTokenState),
	/// No token matched the client/key pair.
	Missing,
}

/// Result of an atomic request-token exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeOutcome {
	/// The request token moved to `Exchanged` and the access token was stored.
	Exchanged,
	/// The request token was not authorized; it was in the contained state.
	StateMismatch(RequestTokenState),
	/// No token matched the client/key pair.
	Missing,
}

/// Error type produced by [`CredentialStore`] implementations and the timeout wrapper.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The store did not answer within the configured timeout.
	#[error("Store call `{operation}` timed out.")]
	Timeout {
		/// Contract operation that timed out.
		operation: &'static str,
	},
}

/// Shared handle that bounds every store call with the configured timeout.
///
/// A call that exceeds the timeout resolves to [`StoreError::Timeout`], which surfaces as
/// [`Error::StoreUnavailable`] rather than as a validation result.
#[derive(Clone)]
pub struct TimedStore {
	inner: Arc<dyn CredentialStore>,
	timeout: std::time::Duration,
}
impl TimedStore {
	/// Wraps `inner` so each call is cancelled after `timeout`.
	pub fn new(inner: Arc<dyn CredentialStore>, timeout: std::time::Duration) -> Self {
		Self { inner, timeout }
	}

	/// Timeout applied to each call.
	pub fn timeout(&self) -> std::time::Duration {
		self.timeout
	}

	/// See [`CredentialStore::get_client`].
	pub async fn get_client(&self, client_key: &ClientKey) -> Result<Option<Client>> {
		self.call("get_client", self.inner.get_client(client_key)).await
	}

	/// See [`CredentialStore::get_request_token`].
	pub async fn get_request_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
	) -> Result<Option<RequestToken>> {
		self.call("get_request_token", self.inner.get_request_token(client_key, token_key)).await
	}

	/// See [`CredentialStore::find_request_token`].
	pub async fn find_request_token(&self, token_key: &TokenKey) -> Result<Option<RequestToken>> {
		self.call("find_request_token", self.inner.find_request_token(token_key)).await
	}

	/// See [`CredentialStore::get_access_token`].
	pub async fn get_access_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
	) -> Result<Option<AccessToken>> {
		self.call("get_access_token", self.inner.get_access_token(client_key, token_key)).await
	}

	/// See [`CredentialStore::save_request_token`].
	pub async fn save_request_token(&self, token: RequestToken) -> Result<()> {
		self.call("save_request_token", self.inner.save_request_token(token)).await
	}

	/// See [`CredentialStore::save_access_token`].
	pub async fn save_access_token(&self, token: AccessToken) -> Result<()> {
		self.call("save_access_token", self.inner.save_access_token(token)).await
	}

	/// See [`CredentialStore::transition_request_token`].
	pub async fn transition_request_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
		expected: &[RequestTokenState],
		replacement: RequestToken,
	) -> Result<TransitionOutcome> {
		self.call(
			"transition_request_token",
			self.inner.transition_request_token(client_key, token_key, expected, replacement),
		)
		.await
	}

	/// See [`CredentialStore::exchange_request_token`].
	pub async fn exchange_request_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
		access_token: AccessToken,
	) -> Result<ExchangeOutcome> {
		self.call(
			"exchange_request_token",
			self.inner.exchange_request_token(client_key, token_key, access_token),
		)
		.await
	}

	/// See [`CredentialStore::revoke_access_token`].
	pub async fn revoke_access_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
		instant: OffsetDateTime,
	) -> Result<Option<AccessToken>> {
		self.call(
			"revoke_access_token",
			self.inner.revoke_access_token(client_key, token_key, instant),
		)
		.await
	}

	async fn call<T>(&self, operation: &'static str, fut: StoreFuture<'_, T>) -> Result<T> {
		match tokio::time::timeout(self.timeout, fut).await {
			Ok(result) => result.map_err(Error::from),
			Err(_) => Err(StoreError::Timeout { operation }.into()),
		}
	}
}
impl Debug for TimedStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TimedStore").field("timeout", &self.timeout).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct StalledStore;

	fn stalled<'a, T>() -> StoreFuture<'a, T>
	where
		T: 'a + Send,
	{
		Box::pin(std::future::pending::<Result<T, StoreError>>())
	}

	impl CredentialStore for StalledStore {
		fn get_client<'a>(&'a self, _: &'a ClientKey) -> StoreFuture<'a, Option<Client>> {
			stalled()
		}

		fn get_request_token<'a>(
			&'a self,
			_: &'a ClientKey,
			_: &'a TokenKey,
		) -> StoreFuture<'a, Option<RequestToken>> {
			stalled()
		}

		fn find_request_token<'a>(
			&'a self,
			_: &'a TokenKey,
		) -> StoreFuture<'a, Option<RequestToken>> {
			stalled()
		}

		fn get_access_token<'a>(
			&'a self,
			_: &'a ClientKey,
			_: &'a TokenKey,
		) -> StoreFuture<'a, Option<AccessToken>> {
			Box::pin(async { Err(StoreError::Backend { message: "disk on fire".into() }) })
		}

		fn save_request_token(&self, _: RequestToken) -> StoreFuture<'_, ()> {
			stalled()
		}

		fn save_access_token(&self, _: AccessToken) -> StoreFuture<'_, ()> {
			stalled()
		}

		fn transition_request_token<'a>(
			&'a self,
			_: &'a ClientKey,
			_: &'a TokenKey,
			_: &'a [RequestTokenState],
			_: RequestToken,
		) -> StoreFuture<'a, TransitionOutcome> {
			stalled()
		}

		fn exchange_request_token<'a>(
			&'a self,
			_: &'a ClientKey,
			_: &'a TokenKey,
			_: AccessToken,
		) -> StoreFuture<'a, ExchangeOutcome> {
			stalled()
		}

		fn revoke_access_token<'a>(
			&'a self,
			_: &'a ClientKey,
			_: &'a TokenKey,
			_: OffsetDateTime,
		) -> StoreFuture<'a, Option<AccessToken>> {
			stalled()
		}
	}

	#[tokio::test]
	async fn stalled_calls_time_out_as_retryable_errors() {
		let store = TimedStore::new(Arc::new(StalledStore), std::time::Duration::from_millis(20));
		let client_key = ClientKey::new("abc").expect("Client fixture should be valid.");
		let err = store
			.get_client(&client_key)
			.await
			.expect_err("A stalled store must not resolve successfully.");

		assert!(err.is_retryable());
		assert!(matches!(
			err,
			Error::StoreUnavailable(StoreError::Timeout { operation: "get_client" })
		));
	}

	#[tokio::test]
	async fn backend_failures_surface_as_store_unavailable() {
		let store = TimedStore::new(Arc::new(StalledStore), std::time::Duration::from_secs(1));
		let client_key = ClientKey::new("abc").expect("Client fixture should be valid.");
		let token_key = TokenKey::new("tok").expect("Token fixture should be valid.");
		let err = store
			.get_access_token(&client_key, &token_key)
			.await
			.expect_err("Backend failures must propagate.");

		assert!(matches!(err, Error::StoreUnavailable(StoreError::Backend { .. })));
	}
}
