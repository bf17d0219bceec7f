//! Error type for `warnwatch-store-sqlite`.

use thiserror::Error;
use warnwatch_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] warnwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl StoreError for Error {
  fn is_not_found(&self) -> bool {
    matches!(self, Error::Core(e) if e.is_not_found())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
