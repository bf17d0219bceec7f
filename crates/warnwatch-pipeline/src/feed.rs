//! The single-entry feed orchestrator.
//!
//! The feed exposes only its newest entry. A new entry is admitted to the
//! feed's own ledger and, since the entry is its own detail, moves straight
//! on to `unseen`. From there it follows the same build and acknowledged
//! delivery stages as the warning feed, so a crash between storing and
//! delivering resends rather than drops.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use warnwatch_core::{
  Error as CoreError,
  announce::Announcement,
  feed::{FeedEntry, build_feed_announcement},
  lifecycle::LifecycleState,
  source::{Delivery, FeedSource},
  store::FeedLedger,
};

use crate::{
  CycleReport, Result,
  cycle::{Payload, build_phase, deliver_phase},
  error::store_err,
};

pub struct FeedPipeline<L, S> {
  ledger: L,
  source: S,
}

impl<L, S> FeedPipeline<L, S>
where
  L: FeedLedger,
  S: FeedSource,
{
  pub fn new(ledger: L, source: S) -> Self { Self { ledger, source } }

  pub fn ledger(&self) -> &L { &self.ledger }

  pub fn source(&self) -> &S { &self.source }

  #[instrument(name = "cycle", skip_all, fields(feed = self.ledger.feed()))]
  pub async fn run_cycle<D: Delivery>(&mut self, delivery: &D) -> Result<CycleReport> {
    let (batch, mut report) = self.prepare().await?;
    deliver_phase(&self.ledger, delivery, &batch, &mut report).await?;
    info!(
      admitted = report.admitted,
      built = report.built,
      delivered = report.delivered,
      "cycle finished"
    );
    Ok(report)
  }

  pub async fn prepare(&mut self) -> Result<(Vec<Announcement>, CycleReport)> {
    let mut report = CycleReport::default();
    self.ingest(&mut report).await?;
    self.promote(&mut report).await?;
    let batch = build_phase(&self.ledger, Payload::Record, &mut report, build).await?;
    Ok((batch, report))
  }

  /// Fetch the latest entry and admit it if its id is new to this feed.
  async fn ingest(&self, report: &mut CycleReport) -> Result<()> {
    let entry = match self.source.fetch_latest().await {
      Ok(entry) => entry,
      Err(e) => {
        warn!(error = %e, "feed fetch failed, treating as empty");
        report.source_unavailable = true;
        None
      }
    };
    let Some(entry) = entry else {
      return Ok(());
    };
    report.fetched = 1;

    let payload = serde_json::to_value(&entry).map_err(CoreError::from)?;
    if self
      .ledger
      .admit(&entry.id, &payload)
      .await
      .map_err(store_err)?
    {
      debug!(id = %entry.id, title = %entry.title, "new feed entry");
      report.admitted += 1;
    } else {
      debug!(id = %entry.id, "latest entry already stored");
    }
    Ok(())
  }

  /// The entry is its own detail: `new` ids need no fetch.
  async fn promote(&self, report: &mut CycleReport) -> Result<()> {
    for id in self
      .ledger
      .ids_in_state(LifecycleState::New)
      .await
      .map_err(store_err)?
    {
      self
        .ledger
        .advance(&id, LifecycleState::Unseen)
        .await
        .map_err(store_err)?;
      report.detailed += 1;
    }
    Ok(())
  }
}

fn build(id: &str, stored: Option<Value>) -> warnwatch_core::Result<Announcement> {
  let stored = stored.ok_or_else(|| CoreError::MissingDetail {
    id:     id.to_owned(),
    reason: "no entry stored",
  })?;
  let entry: FeedEntry = serde_json::from_value(stored)?;
  build_feed_announcement(&entry)
}
