//! Observability helpers: subscriber installation, log sanitization, and flow counters.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment the `authz_sidecar_acquire_total` counter for every
//!   acquisition attempt/cache hit/refresh/failure, labeled by `outcome`.

// self
use crate::{_prelude::*, config::Verbosity};

/// Installs the global tracing subscriber honoring the configured verbosity tier.
pub fn init_tracing(verbosity: Verbosity) {
	let filter = match verbosity {
		Verbosity::Debug => "authz_sidecar=debug,info",
		Verbosity::Default => "authz_sidecar=info,warn",
	};

	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new(filter))
		.with_target(true)
		.init();
}

/// Strips carriage returns and line feeds from request-controlled values.
///
/// Every value derived from an inbound request (authority, path, user-agent, header
/// values) must pass through here before it reaches a log line.
pub fn sanitize(value: &str) -> String {
	value.replace(['\r', '\n'], "")
}

/// Token acquisition outcomes observed by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// Entry to the acquisition path.
	Attempt,
	/// Served from the cached credential without network access.
	CacheHit,
	/// Completed a network refresh and installed a new credential.
	Refreshed,
	/// Acquisition failed and the error was returned to the caller.
	Failure,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Attempt => "attempt",
			AcquireOutcome::CacheHit => "cache_hit",
			AcquireOutcome::Refreshed => "refreshed",
			AcquireOutcome::Failure => "failure",
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_acquire_outcome(outcome: AcquireOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("authz_sidecar_acquire_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
