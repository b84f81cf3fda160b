//! Best-effort JWT payload decoding used to derive credential expiry.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Claims decoding failures.
///
/// These never reach the public error tree: the provider absorbs them with a
/// conservative fallback lifetime and logs the degradation.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not have the three dot-separated JWT segments.
	#[error("Token is not a three-segment JWT (found {segments} segments).")]
	MalformedStructure {
		/// Number of segments actually present.
		segments: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Token payload segment is not valid base64url.")]
	PayloadEncoding(#[from] base64::DecodeError),
	/// Payload segment is not valid claims JSON.
	#[error("Token payload segment is not valid claims JSON.")]
	PayloadJson(#[from] serde_json::Error),
	/// Expiry claim cannot be represented as an instant.
	#[error("Expiry claim is outside the representable time range.")]
	ExpiryOutOfRange(#[from] time::error::ComponentRange),
}

#[derive(Deserialize)]
struct Claims {
	exp: i64,
}

/// Decodes the payload segment of `token` and returns its `exp` claim as an instant.
pub fn decode_expiry(token: &str) -> Result<OffsetDateTime, ClaimsError> {
	let segments = token.split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(ClaimsError::MalformedStructure { segments: segments.len() });
	}

	// Providers emit both padded and unpadded base64url payloads; normalize to unpadded.
	let payload = segments[1].trim_end_matches('=');
	let decoded = URL_SAFE_NO_PAD.decode(payload)?;
	let claims = serde_json::from_slice::<Claims>(&decoded)?;

	OffsetDateTime::from_unix_timestamp(claims.exp).map_err(ClaimsError::from)
}
