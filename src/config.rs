//! Typed provider configuration resolved once at startup.

// self
use crate::{_prelude::*, auth::RealmSet, signature::SignatureMethod};

/// Largest accepted nonce window, clock skew, or request-token lifetime, in seconds.
pub const MAX_WINDOW_SECS: u64 = 86_400;

/// Inclusive bounds for generated token keys, secrets, and verifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
	/// Shortest generated value.
	pub min: usize,
	/// Longest generated value.
	pub max: usize,
}
impl Default for LengthBounds {
	fn default() -> Self {
		Self { min: 20, max: 30 }
	}
}

/// Provider settings with documented defaults.
///
/// | Field | Default |
/// | --- | --- |
/// | `signature_methods` | `["HMAC-SHA1", "RSA-SHA1"]` |
/// | `key_length` | `{ "min": 20, "max": 30 }` |
/// | `default_realms` | empty |
/// | `nonce_window_secs` | `600` |
/// | `timestamp_skew_secs` | `60` |
/// | `request_token_ttl_secs` | `600` |
/// | `store_timeout_ms` | `5000` |
/// | `enforce_ssl` | `true` |
/// | `error_uri` | none |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
	/// Signature methods accepted from clients.
	pub signature_methods: Vec<SignatureMethod>,
	/// Length bounds for generated credentials.
	pub key_length: LengthBounds,
	/// Realms granted to clients that register none of their own.
	pub default_realms: RealmSet,
	/// How far in the past a request timestamp may lie.
	pub nonce_window_secs: u64,
	/// How far in the future a request timestamp may lie.
	pub timestamp_skew_secs: u64,
	/// Lifetime of an unexchanged request token.
	pub request_token_ttl_secs: u64,
	/// Upper bound on each credential store call.
	pub store_timeout_ms: u64,
	/// Rejects plain-HTTP requests when set.
	pub enforce_ssl: bool,
	/// Fallback target for error redirects.
	pub error_uri: Option<Url>,
}
impl ProviderConfig {
	/// Parses a JSON document, reporting the path of the first offending field.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut deserializer)?;

		config.validate()?;

		Ok(config)
	}

	/// Checks bounds that serde cannot express.
	///
	/// Windows and lifetimes are capped at [`MAX_WINDOW_SECS`].
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.signature_methods.is_empty() {
			return Err(ConfigError::NoSignatureMethods);
		}

		let LengthBounds { min, max } = self.key_length;

		if min == 0 || min > max {
			return Err(ConfigError::InvalidKeyLength { min, max });
		}

		for (field, value) in [
			("nonce_window_secs", self.nonce_window_secs),
			("request_token_ttl_secs", self.request_token_ttl_secs),
			("store_timeout_ms", self.store_timeout_ms),
		] {
			if value == 0 {
				return Err(ConfigError::NonPositive { field });
			}
		}
		for (field, value) in [
			("nonce_window_secs", self.nonce_window_secs),
			("timestamp_skew_secs", self.timestamp_skew_secs),
			("request_token_ttl_secs", self.request_token_ttl_secs),
		] {
			if value > MAX_WINDOW_SECS {
				return Err(ConfigError::OutOfRange { field, max: MAX_WINDOW_SECS });
			}
		}

		Ok(())
	}

	/// Nonce validity window.
	pub fn nonce_window(&self) -> Duration {
		seconds(self.nonce_window_secs)
	}

	/// Forward clock-skew tolerance.
	pub fn timestamp_skew(&self) -> Duration {
		seconds(self.timestamp_skew_secs)
	}

	/// Request-token lifetime.
	pub fn request_token_ttl(&self) -> Duration {
		seconds(self.request_token_ttl_secs)
	}

	/// Per-call store timeout.
	pub fn store_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.store_timeout_ms)
	}
}
impl Default for ProviderConfig {
	fn default() -> Self {
		Self {
			signature_methods: SignatureMethod::DEFAULT_ALLOWED.to_vec(),
			key_length: LengthBounds::default(),
			default_realms: RealmSet::default(),
			nonce_window_secs: 600,
			timestamp_skew_secs: 60,
			request_token_ttl_secs: 600,
			store_timeout_ms: 5_000,
			enforce_ssl: true,
			error_uri: None,
		}
	}
}

fn seconds(value: u64) -> Duration {
	Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = ProviderConfig::default();

		config.validate().expect("Default configuration should validate.");

		assert_eq!(config.nonce_window(), Duration::minutes(10));
		assert_eq!(config.timestamp_skew(), Duration::minutes(1));
		assert_eq!(config.store_timeout(), std::time::Duration::from_secs(5));
		assert!(config.enforce_ssl);
	}

	#[test]
	fn partial_documents_fill_defaults() {
		let config = ProviderConfig::from_json_str(
			r#"{"signature_methods":["HMAC-SHA1","PLAINTEXT"],"default_realms":["photos","email"],"error_uri":"https://provider.example.com/oauth/errors"}"#,
		)
		.expect("Partial configuration should parse.");

		assert_eq!(
			config.signature_methods,
			vec![SignatureMethod::HmacSha1, SignatureMethod::Plaintext]
		);
		assert!(config.default_realms.contains("photos"));
		assert_eq!(config.key_length, LengthBounds::default());
		assert_eq!(config.request_token_ttl_secs, 600);
	}

	#[test]
	fn parse_errors_report_field_path() {
		let err = ProviderConfig::from_json_str(r#"{"key_length":{"min":"twenty","max":30}}"#)
			.expect_err("A string length should be rejected.");

		match err {
			ConfigError::Parse { path, .. } => assert_eq!(path, "key_length.min"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn invalid_bounds_are_rejected() {
		let inverted = ProviderConfig {
			key_length: LengthBounds { min: 31, max: 30 },
			..Default::default()
		};

		assert!(matches!(
			inverted.validate(),
			Err(ConfigError::InvalidKeyLength { min: 31, max: 30 })
		));

		let no_methods = ProviderConfig { signature_methods: Vec::new(), ..Default::default() };

		assert!(matches!(no_methods.validate(), Err(ConfigError::NoSignatureMethods)));

		let zero_window = ProviderConfig { nonce_window_secs: 0, ..Default::default() };

		assert!(matches!(
			zero_window.validate(),
			Err(ConfigError::NonPositive { field: "nonce_window_secs" })
		));
	}

	#[test]
	fn oversized_windows_are_rejected() {
		for config in [
			ProviderConfig { nonce_window_secs: u64::MAX, ..Default::default() },
			ProviderConfig { timestamp_skew_secs: MAX_WINDOW_SECS + 1, ..Default::default() },
			ProviderConfig { request_token_ttl_secs: 1_000_000_000_000, ..Default::default() },
		] {
			assert!(matches!(
				config.validate(),
				Err(ConfigError::OutOfRange { max: MAX_WINDOW_SECS, .. })
			));
		}

		let widest = ProviderConfig {
			nonce_window_secs: MAX_WINDOW_SECS,
			timestamp_skew_secs: MAX_WINDOW_SECS,
			request_token_ttl_secs: MAX_WINDOW_SECS,
			..Default::default()
		};

		widest.validate().expect("Windows at the cap should validate.");
		assert!(matches!(
			ProviderConfig::from_json_str(r#"{"timestamp_skew_secs":18446744073709551615}"#),
			Err(ConfigError::OutOfRange { field: "timestamp_skew_secs", .. })
		));
	}

	#[test]
	fn unknown_signature_methods_fail_to_parse() {
		assert!(matches!(
			ProviderConfig::from_json_str(r#"{"signature_methods":["HMAC-SHA256"]}"#),
			Err(ConfigError::Parse { .. })
		));
	}
}
