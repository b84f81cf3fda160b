//! Router assembly and process lifecycle for the sidecar.

// crates.io
use axum::{Router, routing::any};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{_prelude::*, check, config::ConfigSnapshot, token::TokenProvider};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
	/// Immutable startup snapshot.
	pub config: Arc<ConfigSnapshot>,
	/// Process-wide token provider.
	pub token_provider: Arc<TokenProvider>,
}

/// The sidecar HTTP server.
#[derive(Debug)]
pub struct Server {
	state: AppState,
}
impl Server {
	/// Builds the server and its token provider from the startup snapshot.
	pub fn new(config: ConfigSnapshot) -> Result<Self> {
		let token_provider = Arc::new(TokenProvider::new(&config)?);

		Ok(Self { state: AppState { config: Arc::new(config), token_provider } })
	}

	/// Returns the shared state.
	pub fn state(&self) -> &AppState {
		&self.state
	}

	/// Builds the router with the check, liveness, and catch-all routes.
	pub fn router(&self) -> Router {
		router(self.state.clone())
	}

	/// Performs the startup token pre-fetch.
	///
	/// A failed pre-fetch is tolerated; the first check request retries on its own.
	pub async fn prefetch_token(&self) {
		if let Err(err) = self.state.token_provider.acquire().await {
			tracing::warn!(
				error = %err,
				"Initial token fetch failed; retrying on the first check request."
			);
		}
	}

	/// Binds the configured wildcard address and serves until the process is killed.
	pub async fn run(self) -> Result<()> {
		let address = self.state.config.listen_address();
		let router = self.router();

		tracing::info!(%address, "Starting the authorization sidecar.");

		let listener = TcpListener::bind(address).await?;

		axum::serve(listener, router).await?;

		Ok(())
	}
}
impl Debug for AppState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppState")
			.field("config", &self.config)
			.field("token_provider", &self.token_provider)
			.finish()
	}
}

/// Assembles the sidecar router around the provided state.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/check", any(check::check))
		.route("/check/{*rest}", any(check::check))
		.route("/healthz", any(check::healthz))
		.fallback(check::not_found)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
