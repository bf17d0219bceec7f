//! Interval scheduling of the pipelines.
//!
//! Each pipeline runs a cycle, then sleeps for the interval, so cycles of one
//! feed never overlap. Shutdown is observed between cycles: a cycle in flight
//! always finishes.

use std::{io, time::Duration};

use tokio::sync::watch;
use tracing::{error, info};
use warnwatch_core::store::FeedLedger;
use warnwatch_pipeline::CycleReport;

use crate::{AnyDelivery, Feed, Warnings};

/// One schedulable pipeline.
pub trait Cycle {
  fn feed(&self) -> &str;

  fn cycle(
    &mut self,
    delivery: &AnyDelivery,
  ) -> impl Future<Output = warnwatch_pipeline::Result<CycleReport>>;
}

impl Cycle for Warnings {
  fn feed(&self) -> &str { self.ledger().feed() }

  async fn cycle(&mut self, delivery: &AnyDelivery) -> warnwatch_pipeline::Result<CycleReport> {
    self.run_cycle(delivery).await
  }
}

impl Cycle for Feed {
  fn feed(&self) -> &str { self.ledger().feed() }

  async fn cycle(&mut self, delivery: &AnyDelivery) -> warnwatch_pipeline::Result<CycleReport> {
    self.run_cycle(delivery).await
  }
}

/// A shutdown flag that flips to `true` once `signal` resolves.
///
/// If the signal cannot be installed the flag never flips; the loops keep
/// running until the process is killed.
pub fn shutdown_on<F>(signal: F) -> watch::Receiver<bool>
where
  F: Future<Output = io::Result<()>> + Send + 'static,
{
  let (stop, shutdown) = watch::channel(false);
  tokio::spawn(async move {
    match signal.await {
      Ok(()) => {
        info!("shutdown requested, finishing current cycles");
        stop.send(true).ok();
      }
      Err(e) => {
        error!(error = %e, "cannot listen for shutdown signal, graceful shutdown disabled");
        // Dropping `stop` would end the loops.
        stop.closed().await;
      }
    }
  });
  shutdown
}

/// Run `pipeline` every `interval` until `shutdown` flips to `true`.
///
/// A cycle that fails on a store error is logged and retried on the next
/// tick.
pub async fn run_every<C: Cycle>(
  mut pipeline: C,
  delivery: &AnyDelivery,
  interval: Duration,
  mut shutdown: watch::Receiver<bool>,
) {
  info!(feed = pipeline.feed(), ?interval, "starting");
  loop {
    if *shutdown.borrow() {
      break;
    }
    if let Err(e) = pipeline.cycle(delivery).await {
      error!(feed = pipeline.feed(), error = %e, "cycle aborted");
    }
    tokio::select! {
      _ = tokio::time::sleep(interval) => {}
      changed = shutdown.changed() => {
        if changed.is_err() || *shutdown.borrow() {
          break;
        }
      }
    }
  }
  info!(feed = pipeline.feed(), "stopped");
}
