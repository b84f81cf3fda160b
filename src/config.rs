//! Immutable configuration snapshot resolved once at process start.

// std
use std::{env, net::SocketAddr};
// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Environment variable naming the OIDC token endpoint URL.
pub const TOKEN_REQUEST_URL_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
/// Environment variable carrying the ambient bearer for token requests.
pub const TOKEN_REQUEST_TOKEN_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";
/// Environment variable carrying the Host-header override for token requests.
pub const OIDC_HOSTNAME_VAR: &str = "GITHUB_OIDC_HOSTNAME";
/// Environment variable naming the injected credential header.
pub const TOKEN_HEADER_NAME_VAR: &str = "GITHUB_OIDC_TOKEN_HEADER_NAME";
/// Environment variable carrying the repository identifier to inject.
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Environment variable carrying the DNS-zone suffix gating authority rewrites.
pub const DNS_ZONE_VAR: &str = "MAIN_DNS_ZONE";
/// Environment variable carrying the listen port.
pub const LISTEN_PORT_VAR: &str = "AUTH_SERVICE_PORT";
/// Optional environment variable overriding the token audience.
pub const AUDIENCE_VAR: &str = "OIDC_TOKEN_AUDIENCE";
/// Optional environment variable switching the log verbosity tier.
pub const VERBOSITY_VAR: &str = "AUTH_SERVICE_LOG";

const DEFAULT_AUDIENCE: &str = "gap";

/// Log verbosity tiers selectable at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
	/// Operational logging only.
	#[default]
	Default,
	/// Per-request detail, including cache hits and header injection.
	Debug,
}
impl Verbosity {
	fn from_env_value(value: Option<String>) -> Self {
		match value.as_deref() {
			Some("debug") => Self::Debug,
			_ => Self::Default,
		}
	}
}

/// Read-only operational parameters shared by every component.
///
/// The snapshot is resolved exactly once at startup and handed out behind an
/// [`Arc`](std::sync::Arc); nothing mutates it afterwards.
#[derive(Clone, Debug)]
pub struct ConfigSnapshot {
	/// Token endpoint URL with the audience query pair already applied.
	pub token_request_url: Url,
	/// Ambient bearer used to authenticate token requests.
	pub token_request_bearer: TokenSecret,
	/// Host-header override for token requests.
	pub oidc_hostname: String,
	/// Name of the credential header injected into authorized requests.
	pub token_header_name: String,
	/// Value of the injected `x-repository` header.
	pub repository: String,
	/// DNS-zone suffix gating authority rewrites.
	pub dns_zone: String,
	/// Listen port bound on all interfaces.
	pub listen_port: u16,
	/// Selected log verbosity tier.
	pub verbosity: Verbosity,
}
impl ConfigSnapshot {
	/// Resolves the snapshot from the process environment.
	///
	/// Unset and empty variables both count as missing; every missing required name is
	/// reported in one [`ConfigError::MissingEnv`].
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Wildcard listen address; containerized deployments require binding all interfaces.
	pub fn listen_address(&self) -> SocketAddr {
		SocketAddr::from(([0, 0, 0, 0], self.listen_port))
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let mut missing = Vec::new();
		let mut required = |name: &str| {
			match lookup(name).filter(|value| !value.is_empty()) {
				Some(value) => value,
				None => {
					missing.push(name.to_owned());

					String::new()
				},
			}
		};
		let raw_url = required(TOKEN_REQUEST_URL_VAR);
		let raw_bearer = required(TOKEN_REQUEST_TOKEN_VAR);
		let oidc_hostname = required(OIDC_HOSTNAME_VAR);
		let token_header_name = required(TOKEN_HEADER_NAME_VAR);
		let repository = required(REPOSITORY_VAR);
		let dns_zone = required(DNS_ZONE_VAR);
		let raw_port = required(LISTEN_PORT_VAR);

		if !missing.is_empty() {
			return Err(ConfigError::MissingEnv { names: missing });
		}

		let mut token_request_url =
			Url::parse(&raw_url).map_err(|e| ConfigError::invalid(TOKEN_REQUEST_URL_VAR, e))?;
		let audience = lookup(AUDIENCE_VAR)
			.filter(|value| !value.is_empty())
			.unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned());

		token_request_url.query_pairs_mut().append_pair("audience", &audience);

		let listen_port =
			raw_port.parse::<u16>().map_err(|e| ConfigError::invalid(LISTEN_PORT_VAR, e))?;
		let verbosity = Verbosity::from_env_value(lookup(VERBOSITY_VAR));

		Ok(Self {
			token_request_url,
			token_request_bearer: TokenSecret::new(raw_bearer),
			oidc_hostname,
			token_header_name,
			repository,
			dns_zone,
			listen_port,
			verbosity,
		})
	}
}
