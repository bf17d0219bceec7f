//! The warning-feed orchestrator.
//!
//! One cycle: fetch the summary list, admit every id the ledger has not seen,
//! fetch details for ids at `new`, build announcements for ids at `unseen`,
//! deliver them, and mark acknowledged ids `seen`. Cycles of one pipeline
//! never overlap; `run_cycle` takes `&mut self`.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};
use warnwatch_core::{
  announce::{Announcement, LogoUrls, build_announcement},
  lifecycle::LifecycleState,
  record::{Detail, Record},
  source::{CatalogSource, Delivery, WarningSource},
  store::{CatalogStore, FeedLedger},
};

use crate::{
  CycleReport, MetadataCatalog, Result,
  cycle::{Payload, build_phase, deliver_phase},
  details::{DetailOutcome, ensure_details},
  error::store_err,
};

pub struct WarningPipeline<L, C, S> {
  ledger:  L,
  catalog: MetadataCatalog<C>,
  source:  S,
  logos:   LogoUrls,
}

impl<L, C, S> WarningPipeline<L, C, S>
where
  L: FeedLedger,
  C: CatalogStore,
  S: WarningSource + CatalogSource,
{
  pub fn new(ledger: L, catalog: MetadataCatalog<C>, source: S, logos: LogoUrls) -> Self {
    Self { ledger, catalog, source, logos }
  }

  pub fn ledger(&self) -> &L { &self.ledger }

  pub fn catalog(&self) -> &MetadataCatalog<C> { &self.catalog }

  pub fn catalog_mut(&mut self) -> &mut MetadataCatalog<C> { &mut self.catalog }

  pub fn source(&self) -> &S { &self.source }

  /// Run one full cycle against `delivery`.
  #[instrument(name = "cycle", skip_all, fields(feed = self.ledger.feed()))]
  pub async fn run_cycle<D: Delivery>(&mut self, delivery: &D) -> Result<CycleReport> {
    let (batch, mut report) = self.prepare().await?;
    self.deliver(delivery, &batch, &mut report).await?;
    info!(
      fetched = report.fetched,
      admitted = report.admitted,
      degraded = report.degraded,
      built = report.built,
      delivered = report.delivered,
      build_failures = report.build_failures.len(),
      delivery_failures = report.delivery_failures.len(),
      "cycle finished"
    );
    Ok(report)
  }

  /// Everything up to, but excluding, delivery. Returns the batch in the
  /// order it must be delivered.
  pub async fn prepare(&mut self) -> Result<(Vec<Announcement>, CycleReport)> {
    let mut report = CycleReport::default();

    self.catalog.refresh_if_stale(&self.source).await?;
    self.ingest(&mut report).await?;
    self.fetch_details(&mut report).await?;
    let batch = self.build(&mut report).await?;
    Ok((batch, report))
  }

  /// Fetch the summary list and admit every id not yet in the record store.
  /// An unreachable source counts as an empty list.
  pub async fn ingest(&self, report: &mut CycleReport) -> Result<()> {
    let summaries = match self.source.fetch_summaries().await {
      Ok(s) => s,
      Err(e) => {
        warn!(error = %e, "summary fetch failed, treating as empty");
        report.source_unavailable = true;
        Vec::new()
      }
    };
    report.fetched = summaries.len();

    let known: BTreeSet<String> = self.ledger.list_record_ids().await.map_err(store_err)?;

    for raw in summaries {
      let record = match Record::from_raw(raw) {
        Ok(r) => r,
        Err(e) => {
          warn!(error = %e, "skipping summary entry without a usable id");
          continue;
        }
      };
      if known.contains(&record.id) {
        continue;
      }
      if self
        .ledger
        .admit(&record.id, &record.raw)
        .await
        .map_err(store_err)?
      {
        debug!(id = %record.id, version = record.version, "new record");
        report.admitted += 1;
      }
    }
    Ok(())
  }

  /// Make sure every `new` id has a stored detail, then move it to `unseen`.
  pub async fn fetch_details(&self, report: &mut CycleReport) -> Result<()> {
    let ids = self
      .ledger
      .ids_in_state(LifecycleState::New)
      .await
      .map_err(store_err)?;

    for id in ids {
      if ensure_details(&self.ledger, &self.source, &id).await? == DetailOutcome::Degraded {
        report.degraded += 1;
      }
      self
        .ledger
        .advance(&id, LifecycleState::Unseen)
        .await
        .map_err(store_err)?;
      report.detailed += 1;
    }
    Ok(())
  }

  /// Build announcements for carried-over `rewritten` ids and all `unseen`
  /// ids.
  pub async fn build(&self, report: &mut CycleReport) -> Result<Vec<Announcement>> {
    let catalog = self.catalog.snapshot();
    let logos = &self.logos;
    build_phase(&self.ledger, Payload::Detail, report, |id, stored| {
      let detail = stored.as_ref().map(Detail::from_raw).transpose()?;
      build_announcement(id, detail.as_ref(), catalog, logos)
    })
    .await
  }

  pub async fn deliver<D: Delivery>(
    &self,
    delivery: &D,
    batch: &[Announcement],
    report: &mut CycleReport,
  ) -> Result<()> {
    deliver_phase(&self.ledger, delivery, batch, report).await
  }
}
