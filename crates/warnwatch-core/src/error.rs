//! Error types for `warnwatch-core`.

use thiserror::Error;

use crate::lifecycle::LifecycleState;

#[derive(Debug, Error)]
pub enum Error {
  /// A store lookup missed. Callers decide whether that is expected.
  #[error("{table} entry not found: {id}")]
  NotFound { table: &'static str, id: String },

  #[error("invalid lifecycle state: {0:?}")]
  InvalidState(String),

  #[error("illegal lifecycle transition for {id}: {from} -> {to}")]
  IllegalTransition {
    id:   String,
    from: LifecycleState,
    to:   LifecycleState,
  },

  #[error("missing detail for {id}: {reason}")]
  MissingDetail { id: String, reason: &'static str },

  #[error("malformed timestamp {input:?}: {reason}")]
  MalformedTimestamp { input: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn not_found(table: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound { table, id: id.into() }
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
