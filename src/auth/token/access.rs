//! Access-token model.

// self
use crate::{
	_prelude::*,
	auth::{ClientKey, RealmSet, TokenKey, TokenSecret},
};

/// Long-lived credential authorizing resource access, issued once per successful exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
	/// Public token key (`oauth_token`).
	pub key: TokenKey,
	/// Token secret shared with the client at issuance.
	pub secret: TokenSecret,
	/// Client the token was issued to.
	pub client_key: ClientKey,
	/// Realms granted by the resource owner.
	pub realms: RealmSet,
	/// Issuance instant.
	pub issued_at: OffsetDateTime,
	/// Revocation instant if the token has been revoked.
	pub revoked_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Returns `true` if the token has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Marks the token as revoked.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at = Some(instant);
	}

	/// Returns `true` if every required realm was granted to this token.
	pub fn grants(&self, required: &RealmSet) -> bool {
		required.is_subset(&self.realms)
	}
}
