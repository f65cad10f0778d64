//! Assembly and validation of [`Provider`] values.

// self
use crate::{
	_prelude::*,
	config::ProviderConfig,
	issuer::TokenIssuer,
	nonce::NonceCache,
	provider::Provider,
	signature::SignatureValidator,
	store::{CredentialStore, TimedStore},
};

/// Builder for [`Provider`] values.
///
/// The credential store has no default: [`build`](Self::build) fails with
/// [`ConfigError::MissingStore`] rather than silently falling back to process memory.
#[derive(Default)]
pub struct ProviderBuilder {
	config: ProviderConfig,
	store: Option<Arc<dyn CredentialStore>>,
	nonce_cache: Option<Arc<NonceCache>>,
}
impl ProviderBuilder {
	/// Replaces the configuration.
	pub fn config(mut self, config: ProviderConfig) -> Self {
		self.config = config;

		self
	}

	/// Sets the credential store.
	pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Shares an existing replay cache, e.g. between providers fronting the same clients.
	///
	/// When unset, a cache sized from the configured window and skew is created.
	pub fn nonce_cache(mut self, cache: Arc<NonceCache>) -> Self {
		self.nonce_cache = Some(cache);

		self
	}

	/// Validates the configuration and assembles the provider.
	pub fn build(self) -> Result<Provider, ConfigError> {
		let Self { config, store, nonce_cache } = self;
		let store = store.ok_or(ConfigError::MissingStore)?;

		config.validate()?;

		let store = TimedStore::new(store, config.store_timeout());
		let nonces = nonce_cache.unwrap_or_else(|| {
			Arc::new(NonceCache::new(config.nonce_window(), config.timestamp_skew()))
		});
		let issuer = TokenIssuer::new(store.clone(), &config);

		Ok(Provider {
			validator: Arc::new(SignatureValidator::new(config.signature_methods.iter().copied())),
			config: Arc::new(config),
			store,
			nonces,
			issuer,
		})
	}
}
impl Debug for ProviderBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderBuilder")
			.field("config", &self.config)
			.field("store_set", &self.store.is_some())
			.field("nonce_cache_set", &self.nonce_cache.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn build_requires_a_store() {
		let err = Provider::builder().build().expect_err("A store must be mandatory.");

		assert!(matches!(err, ConfigError::MissingStore));
	}

	#[test]
	fn build_validates_configuration() {
		let config = ProviderConfig { signature_methods: Vec::new(), ..Default::default() };
		let err = Provider::builder()
			.config(config)
			.store(Arc::new(MemoryStore::default()))
			.build()
			.expect_err("An empty method list must be rejected.");

		assert!(matches!(err, ConfigError::NoSignatureMethods));
	}

	#[test]
	fn built_provider_reflects_configuration() {
		let shared = Arc::new(NonceCache::default());
		let provider = Provider::builder()
			.config(ProviderConfig { store_timeout_ms: 250, ..Default::default() })
			.store(Arc::new(MemoryStore::default()))
			.nonce_cache(shared.clone())
			.build()
			.expect("Provider should build.");

		assert_eq!(provider.store().timeout(), std::time::Duration::from_millis(250));
		assert!(Arc::ptr_eq(provider.nonce_cache(), &shared));
		assert_eq!(provider.validator().allowed(), ProviderConfig::default().signature_methods);
	}
}
