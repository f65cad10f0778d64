//! Walks a consumer through the full three-legged dance against an in-memory provider: request
//! token, consent, exchange, and a protected call guarded by realm.

// std
use std::sync::Arc;
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use oauth1_provider::{
	auth::{Client, ClientKey, RealmSet, TokenKey},
	config::ProviderConfig,
	flows::ConsentDecision,
	guard::{GuardResponse, Identity},
	provider::Provider,
	request::SignedRequest,
	signature::ClientSigner,
	store::{CredentialStore, MemoryStore},
};

const CALLBACK: &str = "https://printer.example.com/ready";

fn nonce(step: &str) -> String {
	format!("demo-{step}-{}", time::OffsetDateTime::now_utc().unix_timestamp_nanos())
}

fn now() -> i64 {
	time::OffsetDateTime::now_utc().unix_timestamp()
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = Arc::new(MemoryStore::default());

	store.insert_client(
		Client::new(ClientKey::new("printer")?, "printer-secret")
			.with_redirect_uri(Url::parse(CALLBACK)?)
			.with_default_realms(RealmSet::new(["photos"])?),
	);

	let config = ProviderConfig::from_json_str(r#"{"signature_methods":["HMAC-SHA1"]}"#)?;
	let provider = Provider::builder()
		.config(config)
		.store(store.clone() as Arc<dyn CredentialStore>)
		.build()?;
	let _sweeper = provider.spawn_nonce_sweeper(std::time::Duration::from_secs(60));
	let consumer = ClientSigner::new("printer", "printer-secret");
	// Leg one: temporary credentials.
	let request = consumer.sign(
		SignedRequest::new("POST", Url::parse("https://photos.example.net/request_token")?),
		&nonce("request"),
		now(),
		&[("oauth_callback", CALLBACK)],
	)?;
	let issued = provider.request_token(&request).await?.body_params();
	let token = TokenKey::new(issued.get("oauth_token").ok_or_else(|| eyre!("no oauth_token"))?)?;
	let token_secret =
		issued.get("oauth_token_secret").ok_or_else(|| eyre!("no oauth_token_secret"))?.clone();

	println!("request token: {token}");

	// Leg two: the resource owner approves on the consent screen.
	let details = provider.authorization_details(&token).await?;

	println!("{} asks for realms [{}]", details.client_key, details.realms);

	let approved = provider.authorize(ConsentDecision::approve(token.clone())).await?;
	let location = approved.location().ok_or_else(|| eyre!("expected a callback redirect"))?;
	let verifier = location
		.query_pairs()
		.find(|(k, _)| k == "oauth_verifier")
		.map(|(_, v)| v.into_owned())
		.ok_or_else(|| eyre!("callback carried no verifier"))?;

	println!("redirecting owner to {location}");

	// Leg three: trade the verifier for token credentials.
	let request = consumer.clone().with_token(token.as_ref(), token_secret).sign(
		SignedRequest::new("POST", Url::parse("https://photos.example.net/access_token")?),
		&nonce("access"),
		now(),
		&[("oauth_verifier", verifier.as_str())],
	)?;
	let granted = provider.access_token(&request).await?.body_params();
	let access_key = granted.get("oauth_token").ok_or_else(|| eyre!("no access token"))?;
	let access_secret =
		granted.get("oauth_token_secret").ok_or_else(|| eyre!("no access token secret"))?;

	println!("access token: {access_key}");

	let photos = provider.protect(
		RealmSet::new(["photos"])?,
		|identity: Identity, _: SignedRequest| async move {
			format!("photos for {}", identity.client_key)
		},
	);
	let call = consumer.with_token(access_key.as_str(), access_secret.as_str()).sign(
		SignedRequest::new("GET", Url::parse("https://photos.example.net/photos?size=original")?),
		&nonce("resource"),
		now(),
		&[],
	)?;

	match photos.call(call).await? {
		GuardResponse::Allowed(body) => println!("200 OK: {body}"),
		GuardResponse::Forbidden => println!("403 Forbidden"),
	}

	Ok(())
}
