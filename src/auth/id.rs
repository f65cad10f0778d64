//! Consumer and token keys as they travel in `oauth_consumer_key` and `oauth_token`.
//!
//! Keys are restricted to the RFC 3986 unreserved set, so they survive percent-encoding in the
//! `Authorization` header and the signature base string unchanged.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Longest key accepted from the wire.
pub const MAX_KEY_LEN: usize = 128;

/// Why a presented key was refused.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum KeyError {
	/// The decoded parameter was empty.
	#[error("{kind} key is empty.")]
	Empty {
		/// `Consumer` or `Token`.
		kind: &'static str,
	},
	/// The key is longer than [`MAX_KEY_LEN`].
	#[error("{kind} key exceeds 128 bytes.")]
	TooLong {
		/// `Consumer` or `Token`.
		kind: &'static str,
	},
	/// The key holds a character outside `ALPHA / DIGIT / "-" / "." / "_" / "~"`.
	#[error("{kind} key contains {character:?}.")]
	Reserved {
		/// `Consumer` or `Token`.
		kind: &'static str,
		/// First offending character.
		character: char,
	},
}

fn check(kind: &'static str, raw: &str) -> Result<(), KeyError> {
	if raw.is_empty() {
		return Err(KeyError::Empty { kind });
	}
	if raw.len() > MAX_KEY_LEN {
		return Err(KeyError::TooLong { kind });
	}
	if let Some(character) =
		raw.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
	{
		return Err(KeyError::Reserved { kind, character });
	}

	Ok(())
}

macro_rules! wire_key {
	($(#[$meta:meta])* $name:ident, $kind:literal) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates a decoded key.
			pub fn new(raw: impl Into<String>) -> Result<Self, KeyError> {
				Self::try_from(raw.into())
			}
		}
		impl TryFrom<String> for $name {
			type Error = KeyError;

			fn try_from(raw: String) -> Result<Self, Self::Error> {
				check($kind, &raw).map(|()| Self(raw))
			}
		}
		impl From<$name> for String {
			fn from(key: $name) -> Self {
				key.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = KeyError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

wire_key! {
	/// Consumer key of a registered client (`oauth_consumer_key`).
	ClientKey, "Consumer"
}
wire_key! {
	/// Public key of a request or access token (`oauth_token`).
	TokenKey, "Token"
}
impl TokenKey {
	/// Wraps a key drawn from the provider's alphanumeric generator.
	pub(crate) fn from_generated(value: String) -> Self {
		debug_assert!(check("Token", &value).is_ok());

		Self(value)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use percent_encoding::percent_decode_str;
	// self
	use super::*;

	#[test]
	fn unreserved_keys_are_accepted() {
		for raw in ["dpf43f3p2l4k3l03", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb", "a.b_c~d"]
		{
			assert_eq!(ClientKey::new(raw).expect("Unreserved keys should be valid.").as_ref(), raw);
		}
	}

	#[test]
	fn decoded_reserved_characters_are_refused() {
		let decoded = percent_decode_str("abc%20def").decode_utf8().expect("Fixture should decode.");

		assert_eq!(
			ClientKey::new(decoded),
			Err(KeyError::Reserved { kind: "Consumer", character: ' ' })
		);
		assert_eq!(
			TokenKey::new("tok=1"),
			Err(KeyError::Reserved { kind: "Token", character: '=' })
		);
		assert!(matches!(TokenKey::new("t\u{f6}k"), Err(KeyError::Reserved { .. })));
		assert_eq!(TokenKey::new(""), Err(KeyError::Empty { kind: "Token" }));
	}

	#[test]
	fn length_is_capped() {
		TokenKey::new("a".repeat(MAX_KEY_LEN)).expect("A key at the cap should be valid.");

		assert_eq!(
			TokenKey::new("a".repeat(MAX_KEY_LEN + 1)),
			Err(KeyError::TooLong { kind: "Token" })
		);
	}

	#[test]
	fn generated_keys_round_trip_through_the_wire_form() {
		let generated = TokenKey::from_generated("Qx7Lp0aZ9mTt2Rv4Yb8Kc1Nd".into());
		let reparsed: TokenKey = generated.to_string().parse().expect("Generated keys should parse.");

		assert_eq!(reparsed, generated);
		assert_eq!(format!("{generated:?}"), "Token(Qx7Lp0aZ9mTt2Rv4Yb8Kc1Nd)");
	}

	#[test]
	fn deserialization_validates() {
		let key: ClientKey = serde_json::from_str("\"abc\"").expect("Valid keys should deserialize.");

		assert_eq!(&*key, "abc");
		assert!(serde_json::from_str::<TokenKey>("\"a&b\"").is_err());
	}
}
