//! Replay detection for signed requests.
//!
//! Every accepted `(client, token, nonce)` tuple is remembered until its timestamp falls out of
//! the validity window. Check-and-record happens under one lock, so two concurrent requests
//! carrying the same tuple can never both pass.

// std
use std::sync::Weak;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::{ClientKey, TokenKey},
};

/// Default validity window for request timestamps.
pub const DEFAULT_WINDOW: Duration = Duration::seconds(600);
/// Default tolerance for client clocks running ahead of the provider.
pub const DEFAULT_SKEW: Duration = Duration::seconds(60);

/// Reason a nonce/timestamp pair was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum NonceRejection {
	/// The timestamp lies outside `[now - window, now + skew]`.
	#[error("Timestamp is outside the accepted window.")]
	ExpiredTimestamp,
	/// The tuple was already recorded inside the window.
	#[error("Nonce has already been used.")]
	Replayed,
}
impl From<NonceRejection> for Error {
	fn from(rejection: NonceRejection) -> Self {
		match rejection {
			NonceRejection::ExpiredTimestamp => Error::ExpiredTimestamp,
			NonceRejection::Replayed => Error::ReplayedNonce,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NonceKey {
	client_key: ClientKey,
	token_key: Option<TokenKey>,
	nonce: String,
}

#[derive(Debug, Default)]
struct NonceLedger {
	seen: HashMap<NonceKey, i64>,
	// Ordered by expiry so purges only touch what they remove.
	expiries: BTreeSet<(i64, NonceKey)>,
}
impl NonceLedger {
	fn purge(&mut self, now: i64) -> usize {
		let mut purged = 0;

		while let Some((expiry, _)) = self.expiries.first() {
			if *expiry >= now {
				break;
			}

			if let Some((_, key)) = self.expiries.pop_first() {
				self.seen.remove(&key);

				purged += 1;
			}
		}

		purged
	}
}

/// Bounded replay cache keyed by `(client_key, token_key, nonce)`.
#[derive(Debug)]
pub struct NonceCache {
	window: i64,
	skew: i64,
	ledger: Mutex<NonceLedger>,
}
impl NonceCache {
	/// Creates a cache with the provided validity window and forward clock skew.
	pub fn new(window: Duration, skew: Duration) -> Self {
		Self {
			window: window.whole_seconds(),
			skew: skew.whole_seconds(),
			ledger: Mutex::new(NonceLedger::default()),
		}
	}

	/// Validity window applied to timestamps and entries.
	pub fn window(&self) -> Duration {
		Duration::seconds(self.window)
	}

	/// Checks and records a tuple against the current wall clock.
	pub fn check(
		&self,
		client_key: &ClientKey,
		token_key: Option<&TokenKey>,
		nonce: &str,
		timestamp: i64,
	) -> Result<(), NonceRejection> {
		self.check_at(client_key, token_key, nonce, timestamp, now())
	}

	/// Checks and records a tuple, treating `now` (Unix seconds) as the current time.
	pub fn check_at(
		&self,
		client_key: &ClientKey,
		token_key: Option<&TokenKey>,
		nonce: &str,
		timestamp: i64,
		now: i64,
	) -> Result<(), NonceRejection> {
		// Bounds that do not fit in an i64 reject rather than wrap.
		let (Some(earliest), Some(latest), Some(expiry)) = (
			now.checked_sub(self.window),
			now.checked_add(self.skew),
			timestamp.checked_add(self.window),
		) else {
			return Err(NonceRejection::ExpiredTimestamp);
		};

		if timestamp < earliest || timestamp > latest {
			return Err(NonceRejection::ExpiredTimestamp);
		}

		let key = NonceKey {
			client_key: client_key.clone(),
			token_key: token_key.cloned(),
			nonce: nonce.to_owned(),
		};
		let mut ledger = self.ledger.lock();

		ledger.purge(now);

		if ledger.seen.contains_key(&key) {
			return Err(NonceRejection::Replayed);
		}

		ledger.seen.insert(key.clone(), expiry);
		ledger.expiries.insert((expiry, key));

		Ok(())
	}

	/// Boolean form of [`check`](Self::check).
	pub fn accept(
		&self,
		client_key: &ClientKey,
		token_key: Option<&TokenKey>,
		nonce: &str,
		timestamp: i64,
	) -> bool {
		self.check(client_key, token_key, nonce, timestamp).is_ok()
	}

	/// Boolean form of [`check_at`](Self::check_at).
	pub fn accept_at(
		&self,
		client_key: &ClientKey,
		token_key: Option<&TokenKey>,
		nonce: &str,
		timestamp: i64,
		now: i64,
	) -> bool {
		self.check_at(client_key, token_key, nonce, timestamp, now).is_ok()
	}

	/// Drops every entry whose expiry lies before `now`, returning how many were removed.
	pub fn purge_expired_at(&self, now: i64) -> usize {
		self.ledger.lock().purge(now)
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.ledger.lock().seen.len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Spawns a background task that purges expired entries every `every`.
	///
	/// The task holds only a weak reference and exits once the cache is dropped. Requires a
	/// running Tokio runtime.
	pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
		let cache: Weak<Self> = Arc::downgrade(self);

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(every);

			loop {
				interval.tick().await;

				let Some(cache) = cache.upgrade() else {
					break;
				};
				let purged = cache.purge_expired_at(now());

				#[cfg(feature = "tracing")]
				if purged > 0 {
					tracing::debug!(purged, "Swept expired nonces.");
				}
				#[cfg(not(feature = "tracing"))]
				let _ = purged;
			}
		})
	}
}
impl Default for NonceCache {
	fn default() -> Self {
		Self::new(DEFAULT_WINDOW, DEFAULT_SKEW)
	}
}

fn now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const NOW: i64 = 1_700_000_000;

	fn client() -> ClientKey {
		ClientKey::new("abc").expect("Client fixture should be valid.")
	}

	#[test]
	fn same_tuple_is_accepted_once() {
		let cache = NonceCache::default();

		assert!(cache.accept_at(&client(), None, "n1", NOW, NOW));
		assert_eq!(
			cache.check_at(&client(), None, "n1", NOW, NOW + 1),
			Err(NonceRejection::Replayed)
		);
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn tuples_differ_by_token_and_client() {
		let cache = NonceCache::default();
		let token = TokenKey::new("tok").expect("Token fixture should be valid.");
		let other = ClientKey::new("def").expect("Client fixture should be valid.");

		assert!(cache.accept_at(&client(), None, "n1", NOW, NOW));
		assert!(cache.accept_at(&client(), Some(&token), "n1", NOW, NOW));
		assert!(cache.accept_at(&other, None, "n1", NOW, NOW));
		assert_eq!(cache.len(), 3);
	}

	#[test]
	fn timestamps_outside_window_are_rejected() {
		let cache = NonceCache::default();

		assert_eq!(
			cache.check_at(&client(), None, "old", NOW - 601, NOW),
			Err(NonceRejection::ExpiredTimestamp)
		);
		assert_eq!(
			cache.check_at(&client(), None, "future", NOW + 61, NOW),
			Err(NonceRejection::ExpiredTimestamp)
		);
		assert!(cache.accept_at(&client(), None, "edge-old", NOW - 600, NOW));
		assert!(cache.accept_at(&client(), None, "edge-future", NOW + 60, NOW));
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn entries_expire_with_the_window() {
		let cache = NonceCache::default();

		assert!(cache.accept_at(&client(), None, "n1", NOW, NOW));
		assert_eq!(cache.purge_expired_at(NOW + 600), 0);
		assert_eq!(cache.purge_expired_at(NOW + 601), 1);
		assert!(cache.is_empty());
	}

	#[test]
	fn rejection_maps_to_provider_errors() {
		assert!(matches!(Error::from(NonceRejection::Replayed), Error::ReplayedNonce));
		assert!(matches!(Error::from(NonceRejection::ExpiredTimestamp), Error::ExpiredTimestamp));
	}

	#[test]
	fn oversized_windows_fail_closed() {
		let cache = NonceCache::new(Duration::seconds(i64::MAX), Duration::seconds(i64::MAX));

		assert_eq!(
			cache.check_at(&client(), None, "n1", NOW, NOW),
			Err(NonceRejection::ExpiredTimestamp)
		);
		assert_eq!(
			cache.check_at(&client(), None, "n1", NOW, NOW),
			Err(NonceRejection::ExpiredTimestamp)
		);
		assert_eq!(
			cache.check_at(&client(), None, "n2", i64::MIN, i64::MIN),
			Err(NonceRejection::ExpiredTimestamp)
		);
		assert!(cache.is_empty());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_presentations_of_one_nonce_admit_exactly_one() {
		let cache = Arc::new(NonceCache::default());
		let now = now();
		let handles = (0..32)
			.map(|_| {
				let cache = cache.clone();

				tokio::spawn(async move { cache.accept(&client(), None, "shared", now) })
			})
			.collect::<Vec<_>>();
		let mut accepted = 0;

		for handle in handles {
			if handle.await.expect("Nonce task should not panic.") {
				accepted += 1;
			}
		}

		assert_eq!(accepted, 1);
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn sweeper_purges_in_background_and_stops_with_cache() {
		let cache = Arc::new(NonceCache::default());

		assert!(cache.accept_at(&client(), None, "stale", 1_000, 1_000));

		let handle = cache.spawn_sweeper(std::time::Duration::from_millis(5));

		tokio::time::sleep(std::time::Duration::from_millis(50)).await;

		assert!(cache.is_empty());

		drop(cache);

		tokio::time::timeout(std::time::Duration::from_secs(1), handle)
			.await
			.expect("Sweeper should stop once the cache is dropped.")
			.expect("Sweeper task should not panic.");
	}
}
