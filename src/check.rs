//! Per-request check orchestration: credential injection, authority rewriting, and the
//! structured decision mirrored into native response headers.
//!
//! The calling proxy consumes the decision through either sink—some deployments read
//! only the JSON body, others only the native headers—so both carry the identical
//! header set. The one exception is the `:authority` pseudo-header, which the HTTP
//! stack cannot represent as a native HTTP/1 response header; it rides in the body
//! only while `host` carries the same value natively.

// crates.io
use axum::{
	Json,
	extract::{Request, State},
	http::{HeaderName, HeaderValue, Method, StatusCode, Uri, header},
	response::{IntoResponse, Response},
};
// self
use crate::{_prelude::*, authority, obs, server::AppState};

/// Name of the fixed repository-identifying header injected into authorized requests.
pub const REPOSITORY_HEADER: &str = "x-repository";
/// Pseudo-header carrying the forwarding authority understood by the calling proxy.
pub const AUTHORITY_PSEUDO_HEADER: &str = ":authority";
/// Conventional host header mirroring the rewritten authority.
pub const HOST_HEADER: &str = "host";

/// Structured authorization decision returned to the calling proxy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationDecision {
	/// Allow status mirrored from the HTTP response.
	pub status: DecisionStatus,
	/// Headers the proxy injects into the upstream request.
	#[serde(rename = "httpResponse")]
	pub http_response: DecisionHttpResponse,
}
impl AuthorizationDecision {
	/// Builds an allow decision carrying the provided header set.
	pub fn allow(headers: BTreeMap<String, String>) -> Self {
		Self {
			status: DecisionStatus { code: StatusCode::OK.as_u16() },
			http_response: DecisionHttpResponse { headers },
		}
	}
}

/// Numeric allow status of a decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionStatus {
	/// Status code the proxy interprets as the authorization verdict.
	pub code: u16,
}

/// Header portion of a decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionHttpResponse {
	/// Header name to value mapping injected upstream.
	pub headers: BTreeMap<String, String>,
}

/// Handles one authorization check from the proxy.
///
/// A failed token acquisition yields a plain 500 with no authorization headers; the
/// proxy must treat the absence of headers as "not authorized".
pub async fn check(State(state): State<AppState>, request: Request) -> Response {
	tracing::info!(
		method = %request.method(),
		path = %obs::sanitize(request.uri().path()),
		user_agent = %obs::sanitize(user_agent(&request)),
		"Check request."
	);

	let authority = request_authority(&request);

	if authority.is_none() {
		tracing::warn!("Check request carries no authority or host; omitting authority headers.");
	}

	let credential = match state.token_provider.acquire().await {
		Ok(credential) => credential,
		Err(err) => {
			tracing::error!(error = %err, "Failed to acquire an identity token.");

			return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to acquire identity token")
				.into_response();
		},
	};
	let mut headers = BTreeMap::new();

	headers.insert(
		state.config.token_header_name.clone(),
		format!("Bearer {}", credential.token().expose()),
	);
	headers.insert(REPOSITORY_HEADER.to_owned(), state.config.repository.clone());

	if let Some(authority) = authority {
		let rewritten = authority::rewrite(&authority, &state.config.dns_zone);

		if rewritten != authority {
			tracing::info!(
				from = %obs::sanitize(&authority),
				to = %obs::sanitize(&rewritten),
				"Rewrote the forwarding authority."
			);
		}

		headers.insert(AUTHORITY_PSEUDO_HEADER.to_owned(), rewritten.clone());
		headers.insert(HOST_HEADER.to_owned(), rewritten);
	}

	for name in headers.keys() {
		tracing::debug!(header = %obs::sanitize(name), "Injecting header.");
	}

	let decision = AuthorizationDecision::allow(headers);
	let mut response = Json(&decision).into_response();

	apply_native_headers(&mut response, &decision.http_response.headers);

	response
}

/// Liveness endpoint; answers without ever consulting the token provider.
pub async fn healthz() -> &'static str {
	tracing::debug!("Health check request.");

	"OK"
}

/// Catch-all rejection for unknown paths.
pub async fn not_found(method: Method, uri: Uri) -> Response {
	tracing::info!(method = %method, path = %obs::sanitize(uri.path()), "Unknown path.");

	(StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn user_agent(request: &Request) -> &str {
	request
		.headers()
		.get(header::USER_AGENT)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default()
}

// Prefers the `:authority` pseudo-header (surfaced as the request URI authority on
// HTTP/2) and falls back to the conventional host header.
fn request_authority(request: &Request) -> Option<String> {
	if let Some(authority) = request.uri().authority() {
		return Some(authority.to_string());
	}

	request
		.headers()
		.get(header::HOST)
		.and_then(|value| value.to_str().ok())
		.map(ToOwned::to_owned)
}

// Mirrors decision headers onto the native response; names the HTTP stack rejects
// (the `:authority` pseudo-header) stay body-only.
fn apply_native_headers(response: &mut Response, headers: &BTreeMap<String, String>) {
	for (name, value) in headers {
		let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
			tracing::debug!(header = %obs::sanitize(name), "Header is body-only; not natively representable.");

			continue;
		};
		let Ok(value) = HeaderValue::from_str(value) else {
			tracing::warn!(header = %name, "Header value is not natively representable; body only.");

			continue;
		};

		response.headers_mut().insert(name, value);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decision_serializes_the_proxy_wire_shape() {
		let mut headers = BTreeMap::new();

		headers.insert(HOST_HEADER.to_owned(), "svc.example.com:443".to_owned());

		let decision = AuthorizationDecision::allow(headers);
		let payload =
			serde_json::to_value(&decision).expect("Decision should serialize to JSON.");

		assert_eq!(
			payload,
			serde_json::json!({
				"status": { "code": 200 },
				"httpResponse": { "headers": { "host": "svc.example.com:443" } },
			}),
		);
	}

	#[test]
	fn pseudo_headers_are_not_natively_representable() {
		assert!(HeaderName::from_bytes(AUTHORITY_PSEUDO_HEADER.as_bytes()).is_err());
		assert!(HeaderName::from_bytes(REPOSITORY_HEADER.as_bytes()).is_ok());
	}
}
