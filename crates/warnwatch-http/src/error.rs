//! Transport error type for `warnwatch-http`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("GET {url} failed: {source}")]
  Request {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("GET {url} → {status}")]
  Status { url: String, status: StatusCode },

  #[error("decoding response from {url}: {source}")]
  Decode {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("feed xml error: {0}")]
  Feed(#[from] quick_xml::DeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
