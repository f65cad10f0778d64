//! OAuth 1.0a provider core: issue request tokens, drive resource-owner consent, exchange
//! verifiers for access tokens, and guard protected resources with signed-request validation and
//! replay protection.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod guard;
pub mod issuer;
pub mod nonce;
pub mod obs;
pub mod provider;
pub mod request;
pub mod signature;
pub mod store;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests and demos.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicU64, Ordering};
	// self
	use crate::{
		auth::{Client, ClientKey, RealmSet},
		config::ProviderConfig,
		provider::Provider,
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a [`Provider`] backed by a fresh in-memory store seeded with `clients`.
	///
	/// Secure transport stays enforced, so fixtures should use `https://` URLs.
	pub fn build_test_provider(
		config: ProviderConfig,
		clients: impl IntoIterator<Item = Client>,
	) -> (Provider, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());

		for client in clients {
			store_backend.insert_client(client);
		}

		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let provider = Provider::builder()
			.config(config)
			.store(store)
			.build()
			.expect("Test provider configuration should be valid.");

		(provider, store_backend)
	}

	/// Creates a client fixture with the provided credentials, callback, and realms.
	pub fn test_client(key: &str, secret: &str, callback: Option<&str>, realms: &[&str]) -> Client {
		let key = ClientKey::new(key).expect("Client key fixture should be valid.");
		let realms =
			RealmSet::new(realms.iter().copied()).expect("Realm fixture should be valid.");
		let mut client = Client::new(key, secret).with_default_realms(realms);

		if let Some(uri) = callback {
			client = client
				.with_redirect_uri(Url::parse(uri).expect("Callback fixture should parse."));
		}

		client
	}

	/// Current Unix timestamp in seconds.
	pub fn now_timestamp() -> i64 {
		OffsetDateTime::now_utc().unix_timestamp()
	}

	/// Process-unique nonce for signing fixtures.
	pub fn unique_nonce() -> String {
		static NEXT: AtomicU64 = AtomicU64::new(0);

		format!("nonce-{}", NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{ConfigError, Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
