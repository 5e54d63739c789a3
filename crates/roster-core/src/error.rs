//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request can never be satisfied, e.g. an identity subscribing to
  /// itself.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("invalid identity {input:?}: {reason}")]
  InvalidIdentity { input: String, reason: &'static str },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn self_subscription(identity: &crate::Identity) -> Self {
    Self::InvalidRequest(format!("{identity} cannot subscribe to itself"))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
