//! Stages shared by both orchestrators: building the outgoing batch and
//! handing it to the delivery channel.

use serde_json::Value;
use tracing::{debug, warn};
use warnwatch_core::{
  announce::Announcement,
  lifecycle::LifecycleState,
  source::Delivery,
  store::{FeedLedger, StoreError as _},
};

use crate::{Result, error::store_err};

/// An id that could not make progress this cycle, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
  pub id:     String,
  pub reason: String,
}

/// What one cycle did. Logged at the end of every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
  /// Entries returned by the source (0 when it was unreachable).
  pub fetched:            usize,
  /// Entries admitted as `new`.
  pub admitted:           usize,
  /// Ids moved from `new` to `unseen`.
  pub detailed:           usize,
  /// Details that failed to fetch and were stored empty.
  pub degraded:           usize,
  /// Announcements in the outgoing batch.
  pub built:              usize,
  pub build_failures:     Vec<Failure>,
  /// Ids acknowledged and moved to `seen`.
  pub delivered:          usize,
  pub delivery_failures:  Vec<Failure>,
  /// True when the source could not be reached this cycle.
  pub source_unavailable: bool,
}

/// Which stored payload an announcement is built from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Payload {
  Detail,
  Record,
}

/// Build the batch for this cycle.
///
/// Ids left at `rewritten` by a failed delivery come first and are rebuilt
/// without a state change; then every `unseen` id is built and moved to
/// `rewritten`. A failed build is recorded and the id stays where it was.
pub(crate) async fn build_phase<L, F>(
  ledger: &L,
  payload: Payload,
  report: &mut CycleReport,
  build: F,
) -> Result<Vec<Announcement>>
where
  L: FeedLedger,
  F: Fn(&str, Option<Value>) -> warnwatch_core::Result<Announcement>,
{
  let retry = ledger
    .ids_in_state(LifecycleState::Rewritten)
    .await
    .map_err(store_err)?;
  let fresh = ledger
    .ids_in_state(LifecycleState::Unseen)
    .await
    .map_err(store_err)?;

  let mut batch = Vec::with_capacity(retry.len() + fresh.len());

  for (id, promote) in retry
    .iter()
    .map(|id| (id, false))
    .chain(fresh.iter().map(|id| (id, true)))
  {
    let id = id.as_str();
    let stored = load(ledger, payload, id).await?;
    match build(id, stored) {
      Ok(announcement) => {
        if promote {
          ledger
            .advance(id, LifecycleState::Rewritten)
            .await
            .map_err(store_err)?;
        }
        batch.push(announcement);
      }
      Err(e) => {
        warn!(feed = ledger.feed(), id, error = %e, "announcement build failed");
        report.build_failures.push(Failure { id: id.to_owned(), reason: e.to_string() });
      }
    }
  }

  report.built = batch.len();
  Ok(batch)
}

async fn load<L: FeedLedger>(ledger: &L, payload: Payload, id: &str) -> Result<Option<Value>> {
  let stored = match payload {
    Payload::Detail => ledger.get_detail(id).await,
    Payload::Record => ledger.get_record(id).await,
  };
  match stored {
    Ok(v) => Ok(Some(v)),
    Err(e) if e.is_not_found() => Ok(None),
    Err(e) => Err(store_err(e)),
  }
}

/// Deliver the batch in order. Only an acknowledged announcement moves its id
/// to `seen`; a failed one stays at `rewritten` and is sent again next cycle.
pub(crate) async fn deliver_phase<L, D>(
  ledger: &L,
  delivery: &D,
  batch: &[Announcement],
  report: &mut CycleReport,
) -> Result<()>
where
  L: FeedLedger,
  D: Delivery,
{
  for announcement in batch {
    let id = announcement.id.as_str();
    match delivery.deliver(announcement).await {
      Ok(ack) => {
        ledger
          .advance(id, LifecycleState::Seen)
          .await
          .map_err(store_err)?;
        debug!(feed = ledger.feed(), id, message_id = ?ack.message_id, "delivered");
        report.delivered += 1;
      }
      Err(e) => {
        warn!(feed = ledger.feed(), id, error = %e, "delivery failed, will retry next cycle");
        report
          .delivery_failures
          .push(Failure { id: id.to_owned(), reason: e.to_string() });
      }
    }
  }
  Ok(())
}
