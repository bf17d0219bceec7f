//! The metadata catalog: sender id → display name and logo.
//!
//! Kept both in the store (so a restart does not need the network) and as an
//! in-memory [`Catalog`] snapshot that the announcement builder reads. A
//! refresh builds the new snapshot completely, persists it in one
//! transaction, and only then swaps it in.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};
use warnwatch_core::{
  catalog::{Catalog, CatalogEntry},
  source::CatalogSource,
  store::CatalogStore,
};

use crate::{Result, error::store_err};

/// How a refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
  /// The catalog now holds this many senders.
  Replaced(usize),
  /// The source was unreachable; the previous catalog is still in place.
  Kept,
}

pub struct MetadataCatalog<C> {
  store:        C,
  current:      Catalog,
  max_age:      Duration,
  refreshed_at: Option<Instant>,
}

impl<C: CatalogStore> MetadataCatalog<C> {
  /// Load the last persisted catalog. It counts as stale until the first
  /// successful refresh.
  pub async fn load(store: C, max_age: Duration) -> Result<Self> {
    let current = store.load_catalog().await.map_err(store_err)?;
    Ok(Self { store, current, max_age, refreshed_at: None })
  }

  pub fn lookup(&self, sender_id: &str) -> Option<&CatalogEntry> {
    self.current.lookup(sender_id)
  }

  pub fn snapshot(&self) -> &Catalog { &self.current }

  pub fn is_stale(&self) -> bool {
    self
      .refreshed_at
      .is_none_or(|at| at.elapsed() >= self.max_age)
  }

  /// Replace the whole catalog with a freshly fetched listing.
  ///
  /// A transport failure leaves both the store and the snapshot untouched.
  pub async fn refresh<S: CatalogSource>(&mut self, source: &S) -> Result<RefreshOutcome> {
    let entries = match source.fetch_catalog().await {
      Ok(entries) => entries,
      Err(e) => {
        warn!(error = %e, "catalog fetch failed, keeping previous catalog");
        return Ok(RefreshOutcome::Kept);
      }
    };

    let next = Catalog::from_entries(entries.iter().cloned());
    if next.is_empty() {
      warn!("catalog source returned no senders, every sender will use the fallback");
    }
    self.store.replace_catalog(entries).await.map_err(store_err)?;

    let count = next.len();
    self.current = next;
    self.refreshed_at = Some(Instant::now());
    info!(senders = count, "catalog refreshed");
    Ok(RefreshOutcome::Replaced(count))
  }

  /// Refresh only when the last successful refresh is older than `max_age`.
  pub async fn refresh_if_stale<S: CatalogSource>(
    &mut self,
    source: &S,
  ) -> Result<Option<RefreshOutcome>> {
    if !self.is_stale() {
      return Ok(None);
    }
    self.refresh(source).await.map(Some)
  }
}
