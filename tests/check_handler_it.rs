mod common;

// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode, header},
	response::Response,
};
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use authz_sidecar::check::{
	AUTHORITY_PSEUDO_HEADER, AuthorizationDecision, HOST_HEADER, REPOSITORY_HEADER,
};
use common::*;

async fn mock_token_endpoint<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let token = token.to_owned();

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "value": token }));
		})
		.await
}

async fn decision_from(response: Response) -> AuthorizationDecision {
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Check response body should be readable.");

	serde_json::from_slice(&body).expect("Check response body should deserialize as a decision.")
}

fn native_header(response: &Response, name: &str) -> Option<String> {
	response
		.headers()
		.get(name)
		.map(|value| value.to_str().expect("Header value should be ASCII.").to_owned())
}

#[tokio::test]
async fn check_mirrors_headers_into_body_and_response() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check")
				.header(header::HOST, "svc.example.com:8080")
				.header(header::USER_AGENT, "envoy")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");

	assert_eq!(response.status(), StatusCode::OK);

	let bearer = format!("Bearer {token}");

	assert_eq!(native_header(&response, TOKEN_HEADER), Some(bearer.clone()));
	assert_eq!(native_header(&response, REPOSITORY_HEADER), Some(REPOSITORY.to_owned()));
	assert_eq!(native_header(&response, HOST_HEADER), Some("svc.example.com:443".to_owned()));

	let decision = decision_from(response).await;
	let headers = &decision.http_response.headers;

	assert_eq!(decision.status.code, 200);
	assert_eq!(headers.get(TOKEN_HEADER), Some(&bearer));
	assert_eq!(headers.get(REPOSITORY_HEADER), Some(&REPOSITORY.to_owned()));
	assert_eq!(
		headers.get(AUTHORITY_PSEUDO_HEADER),
		Some(&"svc.example.com:443".to_owned()),
	);
	assert_eq!(headers.get(HOST_HEADER), Some(&"svc.example.com:443".to_owned()));
}

#[tokio::test]
async fn check_prefers_the_request_uri_authority() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	// Absolute-form URI carries the `:authority` pseudo-header on the wire.
	let response = router
		.oneshot(
			Request::builder()
				.uri("http://pseudo.example.com:8080/check")
				.header(header::HOST, "fallback.example.com:9090")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");
	let decision = decision_from(response).await;

	assert_eq!(
		decision.http_response.headers.get(AUTHORITY_PSEUDO_HEADER),
		Some(&"pseudo.example.com:443".to_owned()),
	);
}

#[tokio::test]
async fn out_of_zone_authority_passes_through_unchanged() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check")
				.header(header::HOST, "other.org:8080")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");
	let decision = decision_from(response).await;

	assert_eq!(
		decision.http_response.headers.get(AUTHORITY_PSEUDO_HEADER),
		Some(&"other.org:8080".to_owned()),
	);
}

#[tokio::test]
async fn in_zone_authority_without_port_is_not_touched() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check")
				.header(header::HOST, "svc.example.com")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");
	let decision = decision_from(response).await;

	assert_eq!(
		decision.http_response.headers.get(AUTHORITY_PSEUDO_HEADER),
		Some(&"svc.example.com".to_owned()),
	);
}

#[tokio::test]
async fn check_without_authority_omits_authority_headers() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");

	assert_eq!(response.status(), StatusCode::OK);

	let decision = decision_from(response).await;
	let headers = &decision.http_response.headers;

	assert!(headers.contains_key(TOKEN_HEADER));
	assert!(headers.contains_key(REPOSITORY_HEADER));
	assert!(!headers.contains_key(AUTHORITY_PSEUDO_HEADER));
	assert!(!headers.contains_key(HOST_HEADER));
}

#[tokio::test]
async fn token_failure_yields_500_without_authorization_headers() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(500);
		})
		.await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check")
				.header(header::HOST, "svc.example.com:8080")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(native_header(&response, TOKEN_HEADER), None);
	assert_eq!(native_header(&response, REPOSITORY_HEADER), None);
	assert_eq!(native_header(&response, HOST_HEADER), None);
}

#[tokio::test]
async fn healthz_answers_without_touching_the_provider() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "value": fresh_jwt() }));
		})
		.await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/healthz")
				.body(Body::empty())
				.expect("Health request should build."),
		)
		.await
		.expect("Router should answer the health request.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Health response body should be readable.");

	assert_eq!(&body[..], b"OK");
	assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn unknown_paths_are_rejected_with_404() {
	let server = MockServer::start_async().await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/metrics")
				.body(Body::empty())
				.expect("Request should build."),
		)
		.await
		.expect("Router should answer the request.");

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_subpaths_route_to_the_handler() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let _mock = mock_token_endpoint(&server, &token).await;
	let router = router_for(&server);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/check/extra/segments")
				.body(Body::empty())
				.expect("Check request should build."),
		)
		.await
		.expect("Router should answer the check request.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn concurrent_checks_observe_one_credential() {
	let server = MockServer::start_async().await;
	let token = fresh_jwt();
	let expected = format!("Bearer {token}");
	let mock = server
		.mock_async(move |when, then| {
			when.method(GET).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "value": token }))
				.delay(std::time::Duration::from_millis(200));
		})
		.await;
	let router = router_for(&server);
	let mut handles = Vec::new();

	for _ in 0..6 {
		let router = router.clone();

		handles.push(tokio::spawn(async move {
			router
				.oneshot(
					Request::builder()
						.uri("/check")
						.body(Body::empty())
						.expect("Check request should build."),
				)
				.await
				.expect("Router should answer the check request.")
		}));
	}

	for handle in handles {
		let response = handle.await.expect("Check task should not panic.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(native_header(&response, TOKEN_HEADER), Some(expected.clone()));
	}

	assert_eq!(mock.hits_async().await, 1);
}
