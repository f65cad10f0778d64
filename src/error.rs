//! Provider-level error types shared across flows, validators, and stores.

// self
use crate::_prelude::*;

/// Provider-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical provider error exposed by public APIs.
///
/// Every variant except [`Error::StoreUnavailable`] is terminal for the request that produced
/// it. Flow entry points translate terminal variants into error redirects; the guard folds them
/// into an opaque denial.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Client key is unknown or malformed.
	#[error("Client is unknown or malformed.")]
	InvalidClient,
	/// Token key is unknown, revoked, expired, or no longer in a usable state.
	#[error("Token is unknown or no longer usable.")]
	InvalidToken,
	/// Request token has already been exchanged (or was never authorized).
	#[error("Request token is not in the authorized state.")]
	TokenAlreadyExchanged,
	/// Verifier does not match the one bound to the request token.
	#[error("Verifier does not match the request token.")]
	InvalidVerifier,
	/// Signature method is not allowed or the signature does not verify.
	#[error("Request signature is invalid.")]
	InvalidSignature,
	/// The nonce was already used within the validity window.
	#[error("Nonce has already been used.")]
	ReplayedNonce,
	/// The timestamp lies outside the accepted window.
	#[error("Timestamp is outside the accepted window.")]
	ExpiredTimestamp,
	/// Requested realms exceed what the client or token was granted.
	#[error("Realm is not granted.")]
	RealmNotGranted,
	/// Redirect or callback URI is not registered for the client.
	#[error("Redirect URI is not registered for the client.")]
	InvalidRedirectUri,
	/// Protocol parameters are missing, duplicated, or malformed.
	#[error("Request is malformed: {reason}.")]
	InvalidRequest {
		/// Human-readable reason kept for diagnostics.
		reason: String,
	},
	/// Plain HTTP was used while secure transport is enforced.
	#[error("Secure transport is required.")]
	InsecureTransport,
	/// Credential store failed or timed out; the caller may retry.
	#[error("Credential store is unavailable: {0}")]
	StoreUnavailable(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Builds an [`Error::InvalidRequest`] with the provided reason.
	pub fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}

	/// Stable wire code appended as the `error` parameter of error redirects.
	pub const fn error_code(&self) -> &'static str {
		match self {
			Error::InvalidClient => "invalid_client",
			Error::InvalidToken => "invalid_token",
			Error::TokenAlreadyExchanged => "token_already_exchanged",
			Error::InvalidVerifier => "invalid_verifier",
			Error::InvalidSignature => "invalid_signature",
			Error::ReplayedNonce => "replayed_nonce",
			Error::ExpiredTimestamp => "expired_timestamp",
			Error::RealmNotGranted => "realm_not_granted",
			Error::InvalidRedirectUri => "invalid_redirect_uri",
			Error::InvalidRequest { .. } => "invalid_request",
			Error::InsecureTransport => "insecure_transport",
			Error::StoreUnavailable(_) => "temporarily_unavailable",
			Error::Config(_) => "server_error",
		}
	}

	/// Returns `true` when the failure is transient infrastructure trouble worth retrying.
	pub const fn is_retryable(&self) -> bool {
		matches!(self, Error::StoreUnavailable(_))
	}
}

/// Configuration and startup validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider was built without a credential store.
	#[error("A credential store must be supplied before building the provider.")]
	MissingStore,
	/// No signature methods are allowed.
	#[error("At least one signature method must be allowed.")]
	NoSignatureMethods,
	/// Key length bounds are inverted or zero.
	#[error("Key length bounds are invalid: min {min}, max {max}.")]
	InvalidKeyLength {
		/// Configured lower bound.
		min: usize,
		/// Configured upper bound.
		max: usize,
	},
	/// A window or timeout that must be positive was zero.
	#[error("The {field} setting must be positive.")]
	NonPositive {
		/// Offending field name.
		field: &'static str,
	},
	/// A window or lifetime exceeded its upper bound.
	#[error("The {field} setting must not exceed {max}.")]
	OutOfRange {
		/// Offending field name.
		field: &'static str,
		/// Largest accepted value.
		max: u64,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration could not be parsed at `{path}`.")]
	Parse {
		/// Path of the failing field inside the document.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Default realms are invalid.
	#[error("Configured realms are invalid.")]
	InvalidRealm(#[from] crate::auth::RealmValidationError),
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Parse { path, source: e.into_inner() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn only_store_failures_are_retryable() {
		let store = Error::from(StoreError::Timeout { operation: "get_client" });

		assert!(store.is_retryable());
		assert_eq!(store.error_code(), "temporarily_unavailable");
		assert!(!Error::ReplayedNonce.is_retryable());
		assert!(!Error::InvalidSignature.is_retryable());
	}

	#[test]
	fn store_error_is_exposed_as_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Provider error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn error_codes_are_snake_case() {
		for error in [
			Error::InvalidClient,
			Error::TokenAlreadyExchanged,
			Error::invalid_request("missing oauth_nonce"),
			Error::InsecureTransport,
		] {
			assert!(error.error_code().chars().all(|c| c.is_ascii_lowercase() || c == '_'));
		}
	}
}
