//! Registered client (consumer) model.

// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenSecret},
};

/// Client registered out-of-band by an application owner.
///
/// The provider never mutates clients; it only reads them through the credential store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
	/// Stable consumer key (`oauth_consumer_key`).
	pub key: ClientKey,
	/// Shared secret used for HMAC-SHA1 and PLAINTEXT signatures.
	pub secret: TokenSecret,
	/// Ordered set of callback URIs the client may redirect to; may be empty.
	pub redirect_uris: Vec<Url>,
	/// Realms granted when a request does not name any.
	pub default_realms: RealmSet,
	/// PKCS#1 DER `RSAPublicKey` used to verify RSA-SHA1 signatures.
	pub rsa_public_key: Option<Vec<u8>>,
}
impl Client {
	/// Creates a client with no redirect URIs, realms, or RSA key.
	pub fn new(key: ClientKey, secret: impl Into<String>) -> Self {
		Self {
			key,
			secret: TokenSecret::new(secret),
			redirect_uris: Vec::new(),
			default_realms: RealmSet::default(),
			rsa_public_key: None,
		}
	}

	/// Registers an additional redirect URI, keeping insertion order and skipping duplicates.
	pub fn with_redirect_uri(mut self, uri: Url) -> Self {
		if !self.redirect_uris.contains(&uri) {
			self.redirect_uris.push(uri);
		}

		self
	}

	/// Replaces the default realms.
	pub fn with_default_realms(mut self, realms: RealmSet) -> Self {
		self.default_realms = realms;

		self
	}

	/// Attaches the PKCS#1 DER public key used for RSA-SHA1 verification.
	pub fn with_rsa_public_key(mut self, der: impl Into<Vec<u8>>) -> Self {
		self.rsa_public_key = Some(der.into());

		self
	}

	/// First registered redirect URI, if any.
	pub fn default_redirect_uri(&self) -> Option<&Url> {
		self.redirect_uris.first()
	}

	/// Checks a supplied redirect URI against the registered set.
	///
	/// Only registered URIs are accepted, except that a client without registered URIs accepts
	/// the absence of one.
	pub fn validate_redirect_uri(&self, redirect_uri: Option<&str>) -> bool {
		match redirect_uri {
			None => self.redirect_uris.is_empty(),
			Some(raw) => Url::parse(raw).is_ok_and(|uri| self.redirect_uris.contains(&uri)),
		}
	}
}
