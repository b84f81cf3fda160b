//! Pure authority rewriting that pins in-zone traffic to port 443.

/// Rewrites `authority` so an explicit nonstandard port inside the configured DNS zone
/// is replaced with `:443`.
///
/// Authorities outside the zone pass through unchanged, as do in-zone authorities
/// without an explicit port: the rewrite normalizes a port the client supplied, it
/// never appends one.
pub fn rewrite(authority: &str, dns_zone: &str) -> String {
	if dns_zone.is_empty() || !authority.contains(dns_zone) {
		return authority.to_owned();
	}

	match trailing_port(authority) {
		Some(host) => format!("{host}:443"),
		None => authority.to_owned(),
	}
}

// Returns the host part when `authority` ends in `:<digits>`.
fn trailing_port(authority: &str) -> Option<&str> {
	let (host, port) = authority.rsplit_once(':')?;

	if port.is_empty() || !port.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	}

	Some(host)
}
