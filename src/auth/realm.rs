//! Realm (scope) modeling helpers used by issuance, consent, and the resource guard.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating realms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RealmValidationError {
	/// Empty realm entries are not allowed.
	#[error("Realm entries cannot be empty.")]
	Empty,
	/// Realms cannot contain embedded whitespace characters.
	#[error("Realm contains whitespace: {realm}.")]
	ContainsWhitespace {
		/// The offending realm string.
		realm: String,
	},
}

/// Normalized set of realms.
///
/// Realms are deduplicated and sorted so equality, ordering, hashing, and subset checks stay
/// consistent regardless of the order a client listed them in.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RealmSet {
	realms: Arc<[String]>,
}
impl RealmSet {
	/// Creates a normalized realm set from any iterator.
	pub fn new<I, S>(realms: I) -> Result<Self, RealmValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { realms: normalize(realms)? })
	}

	/// Number of distinct realms.
	pub fn len(&self) -> usize {
		self.realms.len()
	}

	/// Returns true if no realms are defined.
	pub fn is_empty(&self) -> bool {
		self.realms.is_empty()
	}

	/// Returns true if the normalized set contains the provided realm.
	pub fn contains(&self, realm: &str) -> bool {
		self.realms.binary_search_by(|candidate| candidate.as_str().cmp(realm)).is_ok()
	}

	/// Returns true when every realm in `self` is also present in `other`.
	///
	/// The empty set is a subset of every set.
	pub fn is_subset(&self, other: &RealmSet) -> bool {
		self.iter().all(|realm| other.contains(realm))
	}

	/// Iterator over normalized realms.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.realms.iter().map(|s| s.as_str())
	}

	/// Returns the normalized string representation (space-delimited).
	pub fn normalized(&self) -> String {
		self.realms.join(" ")
	}

	/// Returns the underlying slice of realm strings.
	pub fn as_slice(&self) -> &[String] {
		&self.realms
	}
}
impl Debug for RealmSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RealmSet").field(&self.realms).finish()
	}
}
impl Display for RealmSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}

/// Iterator over realm strings.
pub struct RealmIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for RealmIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a RealmSet {
	type IntoIter = RealmIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		RealmIter { inner: self.realms.iter() }
	}
}
impl TryFrom<Vec<String>> for RealmSet {
	type Error = RealmValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for RealmSet {
	type Err = RealmValidationError;

	/// Parses the space-delimited form used by the `realm` authorization parameter.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(RealmValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for RealmSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.realms.len()))?;

		for realm in self.realms.iter() {
			seq.serialize_element(realm)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for RealmSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		RealmSet::new(values).map_err(DeError::custom)
	}
}

fn normalize<I, S>(realms: I) -> Result<Arc<[String]>, RealmValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut set = BTreeSet::new();

	for realm in realms {
		let owned: String = realm.into();

		if owned.is_empty() {
			return Err(RealmValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(RealmValidationError::ContainsWhitespace { realm: owned });
		}

		set.insert(owned);
	}

	Ok(Arc::from(set.into_iter().collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn realms_normalize_and_compare_stably() {
		let lhs = RealmSet::new(["photos", "email", "email"])
			.expect("Left-hand realm set should be valid.");
		let rhs = RealmSet::new(["email", "photos"]).expect("Right-hand realm set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "email photos");
	}

	#[test]
	fn realms_reject_whitespace_padding() {
		let err = RealmSet::new([" email "]).expect_err("Padded realms must be rejected.");

		assert!(matches!(err, RealmValidationError::ContainsWhitespace { .. }));
		assert!(RealmSet::from_str("").is_ok(), "Empty string represents an empty realm set.");
		assert!(RealmSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
		assert!(RealmSet::new([""]).is_err());
	}

	#[test]
	fn subset_checks_follow_set_semantics() {
		let granted = RealmSet::from_str("email photos").expect("Granted realms should parse.");
		let required = RealmSet::from_str("photos").expect("Required realms should parse.");
		let excessive = RealmSet::from_str("photos admin").expect("Excessive realms should parse.");

		assert!(required.is_subset(&granted));
		assert!(RealmSet::default().is_subset(&granted));
		assert!(RealmSet::default().is_subset(&RealmSet::default()));
		assert!(!excessive.is_subset(&granted));
		assert!(!required.is_subset(&RealmSet::default()));
	}

	#[test]
	fn serde_validates_entries() {
		let set: RealmSet =
			serde_json::from_str("[\"write\",\"read\"]").expect("Realm list should deserialize.");

		assert_eq!(set.iter().collect::<Vec<_>>(), vec!["read", "write"]);
		assert!(serde_json::from_str::<RealmSet>("[\"with space\"]").is_err());
	}
}
