//! Shared fixtures for sidecar integration tests.

#![allow(dead_code)]

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use authz_sidecar::{
	config::{ConfigSnapshot, Verbosity},
	server::Server,
	token::{TokenProvider, TokenSecret},
};

/// Credential header name used across the integration suite.
pub const TOKEN_HEADER: &str = "x-oidc-token";
/// Repository identifier injected by the check handler.
pub const REPOSITORY: &str = "acme/gateway";
/// DNS zone gating authority rewrites.
pub const DNS_ZONE: &str = "example.com";
/// Host-header override sent on token requests.
pub const OIDC_HOSTNAME: &str = "oidc.example.com";
/// Ambient bearer authenticating token requests.
pub const AMBIENT_BEARER: &str = "ambient-request-token";

/// Builds a three-segment unsigned JWT whose payload carries the provided expiry.
pub fn jwt_with_exp(exp: i64) -> String {
	let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\",\"typ\":\"JWT\"}");
	let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));

	format!("{header}.{payload}.signature")
}

/// Returns a token that stays fresh for an hour.
pub fn fresh_jwt() -> String {
	jwt_with_exp((OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp())
}

/// Snapshot pointing the provider at the mock token endpoint.
pub fn snapshot_for(server: &MockServer) -> ConfigSnapshot {
	let mut token_request_url = Url::parse(&server.url("/token?api-version=1"))
		.expect("Mock token endpoint URL should parse.");

	token_request_url.query_pairs_mut().append_pair("audience", "gap");

	ConfigSnapshot {
		token_request_url,
		token_request_bearer: TokenSecret::new(AMBIENT_BEARER),
		oidc_hostname: OIDC_HOSTNAME.to_owned(),
		token_header_name: TOKEN_HEADER.to_owned(),
		repository: REPOSITORY.to_owned(),
		dns_zone: DNS_ZONE.to_owned(),
		listen_port: 0,
		verbosity: Verbosity::Default,
	}
}

/// Provider wired against the mock token endpoint.
pub fn provider_for(server: &MockServer) -> TokenProvider {
	TokenProvider::new(&snapshot_for(server)).expect("Token provider should build for tests.")
}

/// Router wired against the mock token endpoint.
pub fn router_for(server: &MockServer) -> axum::Router {
	Server::new(snapshot_for(server)).expect("Server should build for tests.").router()
}
