//! Secret wrapper that redacts sensitive material and compares in constant time.

// crates.io
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping client secrets, token secrets, and verifiers out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Compares against a presented value without leaking the mismatch position through timing.
	pub fn matches(&self, presented: &str) -> bool {
		self.0.as_bytes().ct_eq(presented.as_bytes()).into()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn matches_requires_exact_value() {
		let secret = TokenSecret::new("ver1");

		assert!(secret.matches("ver1"));
		assert!(!secret.matches("ver2"));
		assert!(!secret.matches("ver10"));
		assert!(!secret.matches(""));
	}
}
