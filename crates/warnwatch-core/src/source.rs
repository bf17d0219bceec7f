//! Capabilities the pipeline consumes: upstream sources and the delivery
//! channel.
//!
//! Sources report transport failures as errors; the pipeline decides how to
//! degrade. Implementations live in `warnwatch-http` (and as fakes in tests).

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::{announce::Announcement, catalog::CatalogEntry, feed::FeedEntry};

/// Summary list and per-id details of the primary warning feed.
pub trait WarningSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Current summary list, as raw JSON objects.
  fn fetch_summaries(&self) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send + '_;

  /// Full detail object for `id`.
  fn fetch_detail<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;
}

/// The sender catalog listing.
pub trait CatalogSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_catalog(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;
}

/// Binary logo assets, consumed by delivery channels that embed images.
pub trait LogoSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_logo<'a>(
    &'a self,
    filename: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'a;
}

/// A feed that exposes its latest entry.
pub trait FeedSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The newest entry, or `None` for an empty feed.
  fn fetch_latest(
    &self,
  ) -> impl Future<Output = Result<Option<FeedEntry>, Self::Error>> + Send + '_;
}

// ─── Delivery ────────────────────────────────────────────────────────────────

/// Positive acknowledgment from a delivery channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
  /// Channel-side id of the posted message, if the channel returns one.
  pub message_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
  #[error("delivery channel rejected {id}: {reason}")]
  Rejected { id: String, reason: String },

  #[error("delivery transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Anything that can announce an [`Announcement`]. Only an `Ok` counts as
/// delivered.
pub trait Delivery: Send + Sync {
  fn deliver<'a>(
    &'a self,
    announcement: &'a Announcement,
  ) -> impl Future<Output = Result<Ack, DeliveryError>> + Send + 'a;
}
