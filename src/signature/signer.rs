//! Client-side signing helper used by demos, tests, and relying applications talking to a
//! provider built on this crate.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	RsaPrivateKey,
	pkcs1v15::SigningKey,
	pkcs8::DecodePrivateKey,
	signature::{SignatureEncoding, Signer},
};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	request::{OAUTH_VERSION, SignedRequest},
	signature::{SignatureMethod, base_string, percent_encode, sign_hmac_sha1, sign_plaintext},
};

/// Signs outbound requests with a client's credentials and, optionally, a token.
#[derive(Clone)]
pub struct ClientSigner {
	consumer_key: String,
	consumer_secret: String,
	token: Option<(String, String)>,
	method: SignatureMethod,
	rsa_private_key: Option<Vec<u8>>,
	realm: Option<String>,
}
impl ClientSigner {
	/// Creates an HMAC-SHA1 signer for the provided client credentials.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			token: None,
			method: SignatureMethod::HmacSha1,
			rsa_private_key: None,
			realm: None,
		}
	}

	/// Signs with `oauth_token` and mixes the token secret into the key.
	pub fn with_token(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
		self.token = Some((key.into(), secret.into()));

		self
	}

	/// Overrides the signature method.
	pub fn with_method(mut self, method: SignatureMethod) -> Self {
		self.method = method;

		self
	}

	/// Switches to RSA-SHA1 with a PKCS#8 DER private key.
	pub fn with_rsa_private_key(mut self, der: impl Into<Vec<u8>>) -> Self {
		self.rsa_private_key = Some(der.into());
		self.method = SignatureMethod::RsaSha1;

		self
	}

	/// Sends `realm` in the header; it never enters the base string.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Signs `request`, attaching an `Authorization: OAuth` header.
	///
	/// `extra` carries additional protocol parameters such as `oauth_callback` or
	/// `oauth_verifier`.
	pub fn sign(
		&self,
		request: SignedRequest,
		nonce: &str,
		timestamp: i64,
		extra: &[(&str, &str)],
	) -> Result<SignedRequest> {
		let mut oauth = vec![
			("oauth_consumer_key".to_owned(), self.consumer_key.clone()),
			("oauth_nonce".to_owned(), nonce.to_owned()),
			("oauth_signature_method".to_owned(), self.method.as_str().to_owned()),
			("oauth_timestamp".to_owned(), timestamp.to_string()),
			("oauth_version".to_owned(), OAUTH_VERSION.to_owned()),
		];

		if let Some((key, _)) = &self.token {
			oauth.push(("oauth_token".to_owned(), key.clone()));
		}

		oauth.extend(extra.iter().map(|(name, value)| (name.to_string(), value.to_string())));

		let mut params: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();

		params.extend(request.body_params.iter().cloned());
		params.extend(oauth.iter().cloned());

		let base = base_string(&request.method, &request.url, &params);
		let token_secret = self.token.as_ref().map(|(_, secret)| secret.as_str());
		let signature = match self.method {
			SignatureMethod::HmacSha1 => sign_hmac_sha1(&base, &self.consumer_secret, token_secret),
			SignatureMethod::Plaintext => sign_plaintext(&self.consumer_secret, token_secret),
			SignatureMethod::RsaSha1 => self.sign_rsa_sha1(&base)?,
		};

		oauth.push(("oauth_signature".to_owned(), signature));

		if let Some(realm) = &self.realm {
			oauth.insert(0, ("realm".to_owned(), realm.clone()));
		}

		let header = oauth
			.iter()
			.map(|(name, value)| format!("{}=\"{}\"", percent_encode(name), percent_encode(value)))
			.collect::<Vec<_>>()
			.join(", ");

		Ok(request.with_authorization(format!("OAuth {header}")))
	}

	fn sign_rsa_sha1(&self, base: &str) -> Result<String> {
		let der = self.rsa_private_key.as_deref().ok_or(Error::InvalidSignature)?;
		let key = RsaPrivateKey::from_pkcs8_der(der).map_err(|_| Error::InvalidSignature)?;
		let signature = SigningKey::<Sha1>::new(key)
			.try_sign(base.as_bytes())
			.map_err(|_| Error::InvalidSignature)?;

		Ok(STANDARD.encode(signature.to_bytes()))
	}
}
impl Debug for ClientSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientSigner")
			.field("consumer_key", &self.consumer_key)
			.field("token", &self.token.as_ref().map(|(key, _)| key))
			.field("method", &self.method)
			.field("realm", &self.realm)
			.finish_non_exhaustive()
	}
}
