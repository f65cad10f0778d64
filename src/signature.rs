//! Request signature verification for the HMAC-SHA1, RSA-SHA1, and PLAINTEXT methods.
//!
//! [`SignatureValidator`] reconstructs the base string from a [`SignedRequest`], recomputes the
//! expected signature, and compares it in constant time. Verification never errors: anything
//! missing, malformed, or disallowed verifies as `false`.

pub mod base_string;
pub mod signer;

pub use base_string::*;
pub use signer::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::{hmac, signature as ring_signature};
use subtle::ConstantTimeEq;
// self
use crate::{_prelude::*, auth::Client, request::SignedRequest};

/// Signature methods understood by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// HMAC-SHA1 keyed with the client and token secrets.
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// RSASSA-PKCS1-v1_5 with SHA-1, verified with the client's public key.
	#[serde(rename = "RSA-SHA1")]
	RsaSha1,
	/// The concatenated secrets sent verbatim; only safe over TLS.
	#[serde(rename = "PLAINTEXT")]
	Plaintext,
}
impl SignatureMethod {
	/// Methods allowed when the configuration does not say otherwise.
	pub const DEFAULT_ALLOWED: [SignatureMethod; 2] =
		[SignatureMethod::HmacSha1, SignatureMethod::RsaSha1];

	/// Returns the `oauth_signature_method` label.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::RsaSha1 => "RSA-SHA1",
			SignatureMethod::Plaintext => "PLAINTEXT",
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignatureMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HMAC-SHA1" => Ok(SignatureMethod::HmacSha1),
			"RSA-SHA1" => Ok(SignatureMethod::RsaSha1),
			"PLAINTEXT" => Ok(SignatureMethod::Plaintext),
			_ => Err(Error::InvalidSignature),
		}
	}
}

/// Verifies request signatures against an allow-list of methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureValidator {
	allowed: Vec<SignatureMethod>,
}
impl SignatureValidator {
	/// Creates a validator accepting only `allowed`.
	pub fn new(allowed: impl IntoIterator<Item = SignatureMethod>) -> Self {
		Self { allowed: allowed.into_iter().collect() }
	}

	/// Allowed methods, in configuration order.
	pub fn allowed(&self) -> &[SignatureMethod] {
		&self.allowed
	}

	/// Parses an `oauth_signature_method` value, rejecting anything outside the allow-list.
	pub fn resolve(&self, method: &str) -> Option<SignatureMethod> {
		SignatureMethod::from_str(method).ok().filter(|method| self.allowed.contains(method))
	}

	/// Verifies the request signature for `method` using the client's credentials and, when
	/// present, the token secret.
	pub fn verify(
		&self,
		request: &SignedRequest,
		method: SignatureMethod,
		client: &Client,
		token_secret: Option<&str>,
	) -> bool {
		if !self.allowed.contains(&method) {
			return false;
		}

		let Ok(params) = request.parameters() else {
			return false;
		};
		let mut signatures = params.iter().filter(|(name, _)| name == "oauth_signature");
		let (Some((_, presented)), None) = (signatures.next(), signatures.next()) else {
			return false;
		};
		let base = base_string(&request.method, &request.url, &params);

		match method {
			SignatureMethod::HmacSha1 => {
				let expected = sign_hmac_sha1(&base, client.secret.expose(), token_secret);

				constant_time_eq(&expected, presented)
			},
			SignatureMethod::Plaintext => {
				let expected = sign_plaintext(client.secret.expose(), token_secret);

				constant_time_eq(&expected, presented)
			},
			SignatureMethod::RsaSha1 => match client.rsa_public_key.as_deref() {
				Some(public_key) => verify_rsa_sha1(&base, public_key, presented),
				None => false,
			},
		}
	}

	/// Convenience wrapper that reads `oauth_signature_method` from the request itself.
	pub fn verify_request(
		&self,
		request: &SignedRequest,
		client: &Client,
		token_secret: Option<&str>,
	) -> bool {
		let method = request
			.oauth_params()
			.ok()
			.and_then(|params| self.resolve(&params.signature_method));

		match method {
			Some(method) => self.verify(request, method, client, token_secret),
			None => false,
		}
	}
}
impl Default for SignatureValidator {
	fn default() -> Self {
		Self::new(SignatureMethod::DEFAULT_ALLOWED)
	}
}

/// PLAINTEXT signature, which doubles as the HMAC key: `encode(client_secret)&encode(token_secret)`.
pub fn sign_plaintext(client_secret: &str, token_secret: Option<&str>) -> String {
	format!("{}&{}", percent_encode(client_secret), percent_encode(token_secret.unwrap_or_default()))
}

/// Computes the base64 HMAC-SHA1 signature of `base`.
pub fn sign_hmac_sha1(base: &str, client_secret: &str, token_secret: Option<&str>) -> String {
	let key = hmac::Key::new(
		hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
		sign_plaintext(client_secret, token_secret).as_bytes(),
	);
	let tag = hmac::sign(&key, base.as_bytes());

	STANDARD.encode(tag.as_ref())
}

fn verify_rsa_sha1(base: &str, public_key: &[u8], presented: &str) -> bool {
	let Ok(signature) = STANDARD.decode(presented) else {
		return false;
	};
	let key = ring_signature::UnparsedPublicKey::new(
		&ring_signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
		public_key,
	);

	key.verify(base.as_bytes(), &signature).is_ok()
}

fn constant_time_eq(expected: &str, presented: &str) -> bool {
	expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ClientKey;

	const NOW: &str = "137131201";

	fn client() -> Client {
		Client::new(ClientKey::new("9djdj82h48djs9d2").expect("Client fixture."), "j49sk3j29djd")
	}

	fn signed(method: SignatureMethod, token_secret: Option<&str>) -> SignedRequest {
		let url = Url::parse("https://example.com/request?b5=%3D%253D&a3=a&c%40=&a2=r%20b")
			.expect("Fixture URL should parse.");
		let request = SignedRequest::new("POST", url).with_form_body("c2&a3=2+q");
		let mut signer = ClientSigner::new("9djdj82h48djs9d2", "j49sk3j29djd").with_method(method);

		if let Some(secret) = token_secret {
			signer = signer.with_token("kkk9d7dh3k39sjv7", secret);
		}

		signer
			.sign(request, "7d8f3e4a", NOW.parse().expect("Timestamp fixture."), &[])
			.expect("Signing fixture request should succeed.")
	}

	#[test]
	fn hmac_signatures_round_trip_through_the_validator() {
		let validator = SignatureValidator::default();
		let request = signed(SignatureMethod::HmacSha1, Some("dh893hdasih9"));

		assert!(validator.verify(&request, SignatureMethod::HmacSha1, &client(), Some("dh893hdasih9")));
		assert!(validator.verify_request(&request, &client(), Some("dh893hdasih9")));
		assert!(!validator.verify(&request, SignatureMethod::HmacSha1, &client(), Some("wrong")));
		assert!(!validator.verify(&request, SignatureMethod::HmacSha1, &client(), None));
	}

	#[test]
	fn tampering_with_base_string_breaks_the_signature() {
		let validator = SignatureValidator::default();
		let mut request = signed(SignatureMethod::HmacSha1, None);

		assert!(validator.verify_request(&request, &client(), None));

		request.method = "GET".into();

		assert!(!validator.verify_request(&request, &client(), None));

		let mut request = signed(SignatureMethod::HmacSha1, None);

		request.body_params.push(("extra".into(), "1".into()));

		assert!(!validator.verify_request(&request, &client(), None));
	}

	#[test]
	fn tampering_with_signature_bytes_fails() {
		let validator = SignatureValidator::default();
		let request = signed(SignatureMethod::HmacSha1, None);
		let header = request.authorization.clone().expect("Signer should attach a header.");
		let start = header.find("oauth_signature=\"").expect("Header carries a signature.") + 17;
		let original = header.as_bytes()[start];
		let replacement = if original == b'A' { 'B' } else { 'A' };
		let mut tampered = header.clone();

		tampered.replace_range(start..start + 1, &replacement.to_string());

		let request = request.with_authorization(tampered);

		assert!(!validator.verify_request(&request, &client(), None));
	}

	#[test]
	fn disallowed_or_unknown_methods_are_rejected() {
		let validator = SignatureValidator::default();
		let request = signed(SignatureMethod::Plaintext, Some("dh893hdasih9"));

		assert!(!validator.verify_request(&request, &client(), Some("dh893hdasih9")));
		assert!(validator.resolve("HMAC-SHA256").is_none());
		assert!(validator.resolve("PLAINTEXT").is_none());

		let permissive = SignatureValidator::new([SignatureMethod::Plaintext]);

		assert!(permissive.verify_request(&request, &client(), Some("dh893hdasih9")));
	}

	#[test]
	fn missing_or_malformed_signatures_fail_without_panicking() {
		let validator = SignatureValidator::default();
		let request = SignedRequest::new(
			"GET",
			Url::parse("https://example.com/photos").expect("Fixture URL should parse."),
		);

		assert!(!validator.verify(&request, SignatureMethod::HmacSha1, &client(), None));

		let rsa_client = client().with_rsa_public_key(vec![0_u8; 16]);
		let garbage = request.clone().with_authorization(
			r#"OAuth oauth_consumer_key="9djdj82h48djs9d2", oauth_signature_method="RSA-SHA1", oauth_timestamp="1", oauth_nonce="n", oauth_signature="%%%not-base64""#,
		);

		assert!(!validator.verify(&garbage, SignatureMethod::RsaSha1, &rsa_client, None));
		assert!(!validator.verify(&garbage, SignatureMethod::RsaSha1, &client(), None));
	}

	#[test]
	fn secrets_are_encoded_into_the_key() {
		assert_eq!(sign_plaintext("j49sk3j29djd", Some("dh893hdasih9")), "j49sk3j29djd&dh893hdasih9");
		assert_eq!(sign_plaintext("a&b", None), "a%26b&");
	}

	#[test]
	fn hmac_sha1_matches_known_vector() {
		// Twitter's published OAuth 1.0a signing example.
		let base = "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521";
		let signature = sign_hmac_sha1(
			base,
			"kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
			Some("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"),
		);

		assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
	}
}
