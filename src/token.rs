//! Identity-token domain: the cached credential, claims decoding, and the provider.

pub mod claims;
pub mod credential;
pub mod provider;

pub use credential::{Credential, TokenSecret};
pub use provider::{AcquireMetrics, TokenProvider};
