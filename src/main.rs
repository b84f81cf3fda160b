//! Startup sequencing for the authorization sidecar binary.

// std
use std::process::ExitCode;
// crates.io
use tracing::error;
// self
use authz_sidecar::{config::ConfigSnapshot, obs, server::Server};

#[tokio::main]
async fn main() -> ExitCode {
	let config = match ConfigSnapshot::from_env() {
		Ok(config) => config,
		Err(err) => {
			// The subscriber is not installed yet; configuration failures go to stderr.
			eprintln!("{err}");

			return ExitCode::FAILURE;
		},
	};

	obs::init_tracing(config.verbosity);

	let server = match Server::new(config) {
		Ok(server) => server,
		Err(err) => {
			error!(error = %err, "Failed to construct the sidecar.");

			return ExitCode::FAILURE;
		},
	};

	server.prefetch_token().await;

	if let Err(err) = server.run().await {
		error!(error = %err, "Server terminated.");

		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}
