//! The detail fetcher.
//!
//! Retrieves the full detail object for an id at most once: if the ledger
//! already holds a detail for the id, nothing is fetched. A failed retrieval
//! is stored as `{}` and is not retried; the announcement builder later
//! rejects it and the id waits at `unseen`.

use serde_json::Value;
use tracing::{debug, warn};
use warnwatch_core::{source::WarningSource, store::FeedLedger};

use crate::{Result, error::store_err};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
  /// A detail was already stored; no request was made.
  Cached,
  Fetched,
  /// The request failed and an empty detail was stored in its place.
  Degraded,
}

pub async fn ensure_details<L, S>(ledger: &L, source: &S, id: &str) -> Result<DetailOutcome>
where
  L: FeedLedger,
  S: WarningSource,
{
  if ledger.has_detail(id).await.map_err(store_err)? {
    return Ok(DetailOutcome::Cached);
  }

  let (detail, outcome) = match source.fetch_detail(id).await {
    Ok(detail) => (detail, DetailOutcome::Fetched),
    Err(e) => {
      warn!(id, error = %e, "detail fetch failed, storing empty detail");
      (Value::Object(Default::default()), DetailOutcome::Degraded)
    }
  };

  ledger.put_detail(id, &detail).await.map_err(store_err)?;
  debug!(id, ?outcome, "detail stored");
  Ok(outcome)
}
