//! The immutable provider value that owns every component.
//!
//! A [`Provider`] is assembled once through [`ProviderBuilder`], validated once, and then shared
//! freely: cloning is cheap and every field is read-only. Flow entry points live in
//! [`crate::flows`]; resource protection lives in [`crate::guard`].

pub mod builder;

pub use builder::*;

// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Client, ClientKey, TokenKey},
	config::ProviderConfig,
	issuer::TokenIssuer,
	nonce::NonceCache,
	request::{OAuthParams, SignedRequest},
	signature::SignatureValidator,
	store::TimedStore,
};

const PLACEHOLDER_SECRET: &str = "placeholder-secret-for-unknown-credentials";

/// OAuth 1.0a provider: request-token issuance, consent, exchange, and resource protection.
#[derive(Clone, Debug)]
pub struct Provider {
	config: Arc<ProviderConfig>,
	store: TimedStore,
	validator: Arc<SignatureValidator>,
	nonces: Arc<NonceCache>,
	issuer: TokenIssuer,
}
impl Provider {
	/// Starts a builder with default configuration and no store.
	pub fn builder() -> ProviderBuilder {
		ProviderBuilder::default()
	}

	/// Resolved configuration.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	/// Timeout-bounded handle to the credential store.
	pub fn store(&self) -> &TimedStore {
		&self.store
	}

	/// Signature validator built from the allowed methods.
	pub fn validator(&self) -> &SignatureValidator {
		&self.validator
	}

	/// Shared replay cache.
	pub fn nonce_cache(&self) -> &Arc<NonceCache> {
		&self.nonces
	}

	/// Token issuer bound to the same store.
	pub fn issuer(&self) -> &TokenIssuer {
		&self.issuer
	}

	/// Starts the background nonce sweep. Requires a running Tokio runtime.
	pub fn spawn_nonce_sweeper(&self, every: std::time::Duration) -> JoinHandle<()> {
		self.nonces.spawn_sweeper(every)
	}

	/// Revokes an access token so the guard rejects it from now on.
	pub async fn revoke_access_token(
		&self,
		client_key: &ClientKey,
		token_key: &TokenKey,
	) -> Result<Option<AccessToken>> {
		self.store.revoke_access_token(client_key, token_key, OffsetDateTime::now_utc()).await
	}

	pub(crate) fn ensure_transport(&self, request: &SignedRequest) -> Result<()> {
		if self.config.enforce_ssl && !request.is_secure() {
			return Err(Error::InsecureTransport);
		}

		Ok(())
	}

	/// Loads the signing client. An unknown consumer key still pays for a signature check against
	/// placeholder credentials before [`Error::InvalidClient`] is returned.
	pub(crate) async fn load_client(
		&self,
		request: &SignedRequest,
		params: &OAuthParams,
	) -> Result<Client> {
		match self.store.get_client(&params.consumer_key).await? {
			Some(client) => Ok(client),
			None => {
				self.verify_placeholder(request, params, None);

				Err(Error::InvalidClient)
			},
		}
	}

	/// Runs the signature check against placeholder secrets and discards the verdict, so a missing
	/// client or token takes as long to reject as a bad signature.
	pub(crate) fn verify_placeholder(
		&self,
		request: &SignedRequest,
		params: &OAuthParams,
		client: Option<&Client>,
	) {
		let Some(method) = self.validator.resolve(&params.signature_method) else {
			return;
		};
		let placeholder;
		let client = match client {
			Some(client) => client,
			None => {
				placeholder = Client::new(params.consumer_key.clone(), PLACEHOLDER_SECRET);

				&placeholder
			},
		};
		let _ = self.validator.verify(request, method, client, Some(PLACEHOLDER_SECRET));
	}

	/// Verifies the signature, then records the nonce. Unsigned or forged requests never reach
	/// the replay cache.
	pub(crate) fn verify_signed(
		&self,
		request: &SignedRequest,
		params: &OAuthParams,
		client: &Client,
		token_secret: Option<&str>,
	) -> Result<()> {
		let method =
			self.validator.resolve(&params.signature_method).ok_or(Error::InvalidSignature)?;

		if !self.validator.verify(request, method, client, token_secret) {
			return Err(Error::InvalidSignature);
		}

		self.nonces.check(&client.key, params.token.as_ref(), &params.nonce, params.timestamp)?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::RealmSet, signature::ClientSigner};

	fn placeholder_signed(consumer_key: &str) -> SignedRequest {
		ClientSigner::new(consumer_key, PLACEHOLDER_SECRET)
			.with_token("missing", PLACEHOLDER_SECRET)
			.sign(
				SignedRequest::new(
					"GET",
					Url::parse("https://photos.example.net/photos").expect("Fixture URL should parse."),
				),
				&unique_nonce(),
				now_timestamp(),
				&[],
			)
			.expect("Signing fixture requests should succeed.")
	}

	#[tokio::test]
	async fn placeholder_secrets_never_admit_unknown_credentials() {
		let (provider, _) = build_test_provider(
			ProviderConfig::default(),
			[test_client("abc", "xyz", None, &["photos"])],
		);
		let unknown_client = placeholder_signed("nobody");
		let params = unknown_client.oauth_params().expect("Fixture parameters should parse.");

		assert!(matches!(
			provider.load_client(&unknown_client, &params).await,
			Err(Error::InvalidClient)
		));

		let unknown_token = placeholder_signed("abc");
		let verification = provider
			.verify_request(&unknown_token, &RealmSet::default())
			.await
			.expect("Memory-backed verification should not error.");

		assert!(matches!(verification.denial_reason(), Some(Error::InvalidToken)));
		assert!(provider.nonce_cache().is_empty());
	}
}
