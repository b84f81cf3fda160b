//! Cached token provider with a strictly serialized refresh path.
//!
//! [`TokenProvider::acquire`] reuses the cached credential until it falls inside the
//! freshness margin of its expiry, then performs exactly one network refresh no matter
//! how many callers race for it: stale callers queue behind an async guard, re-check
//! freshness once they hold it (double-checked locking), and either observe the
//! credential the in-flight refresh installed or perform the single refresh themselves.

mod metrics;

pub use metrics::AcquireMetrics;

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::{StatusCode, header, redirect};
// self
use crate::{
	_prelude::*,
	config::ConfigSnapshot,
	error::{AcquireError, ConfigError},
	obs::{self, AcquireOutcome},
	token::{claims, credential::{Credential, TokenSecret}},
};

/// Cached credential must stay valid this long past "now" to be reused; the margin
/// guards against a request reaching the upstream just as the token expires.
const FRESHNESS_MARGIN: Duration = Duration::seconds(60);
/// Conservative lifetime assigned when the token payload cannot be decoded.
const FALLBACK_TTL: Duration = Duration::seconds(300);
/// Client-side timeout on the refresh network call; a timed-out refresh is a failure.
const REFRESH_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[derive(Deserialize)]
struct TokenEndpointResponse {
	value: String,
}

/// Owns the process-wide cached credential and its serialized refresh path.
///
/// Constructed once at startup and shared behind an [`Arc`]; the cached credential and
/// refresh guard are the only mutable state in the process.
pub struct TokenProvider {
	http_client: ReqwestClient,
	request_url: Url,
	request_bearer: TokenSecret,
	hostname: String,
	cached: RwLock<Option<Credential>>,
	refresh_guard: AsyncMutex<()>,
	/// Shared counters describing cache and refresh behavior.
	pub acquire_metrics: Arc<AcquireMetrics>,
}
impl TokenProvider {
	/// Builds a provider from the startup snapshot, provisioning its HTTP client.
	///
	/// Token requests never follow redirects; the endpoint must answer directly.
	pub fn new(config: &ConfigSnapshot) -> Result<Self, ConfigError> {
		let http_client = ReqwestClient::builder()
			.timeout(REFRESH_TIMEOUT)
			.redirect(redirect::Policy::none())
			.build()
			.map_err(|e| ConfigError::HttpClientBuild { source: e })?;

		Ok(Self {
			http_client,
			request_url: config.token_request_url.clone(),
			request_bearer: config.token_request_bearer.clone(),
			hostname: config.oidc_hostname.clone(),
			cached: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			acquire_metrics: Default::default(),
		})
	}

	/// Returns a credential valid beyond the freshness margin, refreshing at most once.
	///
	/// Failures are returned to the caller and never poison the cached credential; the
	/// next acquisition retries independently.
	pub async fn acquire(&self) -> Result<Credential, AcquireError> {
		self.acquire_metrics.record_attempt();
		obs::record_acquire_outcome(AcquireOutcome::Attempt);

		if let Some(credential) = self.cached_fresh(OffsetDateTime::now_utc()) {
			tracing::debug!(expires_at = %credential.expires_at(), "Reusing cached identity token.");

			return Ok(self.cache_hit(credential));
		}

		let _refresh = self.refresh_guard.lock().await;

		// A waiter may find the credential already rotated by the refresh it queued behind.
		if let Some(credential) = self.cached_fresh(OffsetDateTime::now_utc()) {
			tracing::debug!(
				expires_at = %credential.expires_at(),
				"Identity token was refreshed while waiting."
			);

			return Ok(self.cache_hit(credential));
		}

		match self.refresh().await {
			Ok(credential) => {
				*self.cached.write() = Some(credential.clone());
				self.acquire_metrics.record_refresh();
				obs::record_acquire_outcome(AcquireOutcome::Refreshed);

				Ok(credential)
			},
			Err(err) => {
				self.acquire_metrics.record_failure();
				obs::record_acquire_outcome(AcquireOutcome::Failure);

				Err(err)
			},
		}
	}

	fn cache_hit(&self, credential: Credential) -> Credential {
		self.acquire_metrics.record_cache_hit();
		obs::record_acquire_outcome(AcquireOutcome::CacheHit);

		credential
	}

	fn cached_fresh(&self, instant: OffsetDateTime) -> Option<Credential> {
		self.cached
			.read()
			.as_ref()
			.filter(|credential| credential.is_fresh_at(instant, FRESHNESS_MARGIN))
			.cloned()
	}

	async fn refresh(&self) -> Result<Credential, AcquireError> {
		tracing::info!("Fetching a new identity token.");

		let response = self
			.http_client
			.get(self.request_url.clone())
			.header(header::HOST, self.hostname.as_str())
			.header(header::ACCEPT, "application/json")
			.bearer_auth(self.request_bearer.expose())
			.send()
			.await?;
		let status = response.status();

		if status != StatusCode::OK {
			return Err(AcquireError::Endpoint { status: status.as_u16() });
		}

		let body = response.bytes().await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let payload = serde_path_to_error::deserialize::<_, TokenEndpointResponse>(&mut deserializer)
			.map_err(|e| AcquireError::ResponseParse { source: e })?;

		if payload.value.is_empty() {
			return Err(AcquireError::EmptyToken);
		}

		let now = OffsetDateTime::now_utc();
		let expires_at = match claims::decode_expiry(&payload.value) {
			Ok(instant) => instant,
			Err(err) => {
				// Degraded, not fatal: accept the token with a conservative lifetime.
				tracing::warn!(
					error = %err,
					fallback_secs = FALLBACK_TTL.whole_seconds(),
					"Could not decode token expiry; applying the conservative default."
				);

				now + FALLBACK_TTL
			},
		};

		tracing::info!(expires_at = %expires_at, "Identity token fetched.");

		Ok(Credential::new(payload.value, expires_at))
	}
}
impl Debug for TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("request_url", &self.request_url.as_str())
			.field("hostname", &self.hostname)
			.field("request_bearer", &self.request_bearer)
			.finish()
	}
}
