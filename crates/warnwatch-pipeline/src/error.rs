//! Error type for `warnwatch-pipeline`.
//!
//! Only faults that make a cycle meaningless surface here. Transport
//! failures and per-id build failures are logged and recorded in the
//! [`CycleReport`](crate::CycleReport) instead.

use thiserror::Error;
use warnwatch_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Core(#[from] warnwatch_core::Error),
}

pub(crate) fn store_err<E: StoreError>(e: E) -> Error { Error::Store(Box::new(e)) }

pub type Result<T, E = Error> = std::result::Result<T, E>;
