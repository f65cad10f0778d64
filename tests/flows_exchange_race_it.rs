// self
use oauth1_provider::{
	_preludet::*,
	auth::{RequestTokenState, TokenKey},
	config::ProviderConfig,
	flows::ConsentDecision,
	request::SignedRequest,
	signature::ClientSigner,
	store::CredentialStore,
};

fn endpoint(path: &str) -> Url {
	Url::parse(&format!("https://photos.example.net{path}"))
		.expect("Provider endpoint fixture should parse.")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_exchanges_issue_a_single_access_token() {
	let (provider, store) = build_test_provider(
		ProviderConfig::default(),
		[test_client("abc", "xyz", Some("https://printer.example.com/ready"), &["photos"])],
	);
	let issued = ClientSigner::new("abc", "xyz")
		.sign(
			SignedRequest::new("POST", endpoint("/request_token")),
			&unique_nonce(),
			now_timestamp(),
			&[("oauth_callback", "https://printer.example.com/ready")],
		)
		.expect("Signing fixture requests should succeed.");
	let params = provider
		.request_token(&issued)
		.await
		.expect("Memory-backed issuance should not error.")
		.body_params();
	let token = TokenKey::new(&params["oauth_token"]).expect("Issued key should be valid.");
	let secret = params["oauth_token_secret"].clone();
	let approved = provider
		.authorize(ConsentDecision::approve(token.clone()))
		.await
		.expect("Approval should not error.");
	let verifier = approved
		.location()
		.and_then(|url| url.query_pairs().find(|(k, _)| k == "oauth_verifier"))
		.map(|(_, v)| v.into_owned())
		.expect("Approval should redirect with a verifier.");
	let signer = ClientSigner::new("abc", "xyz").with_token(token.as_ref(), secret);
	let handles = (0..16)
		.map(|_| {
			let provider = provider.clone();
			let request = signer
				.sign(
					SignedRequest::new("POST", endpoint("/access_token")),
					&unique_nonce(),
					now_timestamp(),
					&[("oauth_verifier", verifier.as_str())],
				)
				.expect("Signing fixture requests should succeed.");

			tokio::spawn(async move { provider.access_token(&request).await })
		})
		.collect::<Vec<_>>();
	let mut granted = 0;
	let mut rejected = 0;

	for handle in handles {
		let response = handle
			.await
			.expect("Exchange task should not panic.")
			.expect("Memory-backed exchange should not error.");

		match response.error().as_deref() {
			None => granted += 1,
			Some("token_already_exchanged") => rejected += 1,
			Some(other) => panic!("Unexpected exchange failure: {other}."),
		}
	}

	assert_eq!(granted, 1);
	assert_eq!(rejected, 15);
	assert_eq!(store.access_token_count(), 1);

	let state = store
		.find_request_token(&token)
		.await
		.expect("Memory store reads should not fail.")
		.expect("Request token should be stored.")
		.state;

	assert_eq!(state, RequestTokenState::Exchanged);
}
