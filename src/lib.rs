//! Envoy-compatible external authorization sidecar—mint, cache, and inject platform OIDC
//! identity tokens while pinning authorized traffic to port 443.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authority;
pub mod check;
pub mod config;
pub mod error;
pub mod obs;
pub mod server;
pub mod token;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use {httpmock as _, tower as _};
