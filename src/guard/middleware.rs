//! Framework-independent route protection.

// self
use crate::{
	_prelude::*,
	auth::RealmSet,
	guard::{Identity, RequestGuard},
	provider::Provider,
	request::SignedRequest,
};

/// Handler invoked for requests that pass the guard.
///
/// Implemented for every `Fn(Identity, SignedRequest) -> impl Future` closure.
pub trait ResourceHandler<T>
where
	Self: Send + Sync,
{
	/// Serves an authenticated request.
	fn handle(&self, identity: Identity, request: SignedRequest) -> impl Future<Output = T> + Send;
}
impl<F, Fut, T> ResourceHandler<T> for F
where
	F: Send + Sync + Fn(Identity, SignedRequest) -> Fut,
	Fut: Send + Future<Output = T>,
{
	fn handle(&self, identity: Identity, request: SignedRequest) -> impl Future<Output = T> + Send {
		self(identity, request)
	}
}

/// Outcome of a protected call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardResponse<T> {
	/// The handler ran and produced this value.
	Allowed(T),
	/// The request was denied; answer with `403 Forbidden` and no detail.
	Forbidden,
}

/// A handler wrapped by the guard.
#[derive(Clone, Debug)]
pub struct Protected<H> {
	guard: RequestGuard,
	required_realms: RealmSet,
	handler: H,
}
impl<H> Protected<H> {
	/// Wraps `handler` so it only runs for requests granted `required_realms`.
	pub fn new(guard: RequestGuard, required_realms: RealmSet, handler: H) -> Self {
		Self { guard, required_realms, handler }
	}

	/// Realms every request must have been granted.
	pub fn required_realms(&self) -> &RealmSet {
		&self.required_realms
	}

	/// Verifies `request` and runs the handler if allowed.
	pub async fn call<T>(&self, request: SignedRequest) -> Result<GuardResponse<T>>
	where
		H: ResourceHandler<T>,
	{
		let verification = self.guard.verify(&request, &self.required_realms).await?;

		match verification.into_identity() {
			Some(identity) => Ok(GuardResponse::Allowed(self.handler.handle(identity, request).await)),
			None => Ok(GuardResponse::Forbidden),
		}
	}
}

impl Provider {
	/// Wraps `handler` behind this provider's guard.
	pub fn protect<H>(&self, required_realms: RealmSet, handler: H) -> Protected<H> {
		Protected::new(self.guard(), required_realms, handler)
	}
}
