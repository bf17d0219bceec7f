//! The ingestion–dedup–lifecycle pipeline.
//!
//! Two orchestrators share the same mechanics:
//!
//! - [`WarningPipeline`] polls the summary list, admits unseen ids, fetches
//!   their details, builds announcements and hands them to a
//!   [`Delivery`](warnwatch_core::source::Delivery).
//! - [`FeedPipeline`] does the same for a feed that only exposes its latest
//!   entry, which doubles as its own detail.
//!
//! Each id moves `new → unseen → rewritten → seen` in its feed's ledger, and
//! only an acknowledged delivery reaches `seen`.
//!
//! Everything here is generic over the core traits; no HTTP or SQL.

pub mod catalog;
pub mod cycle;
pub mod details;
pub mod error;
pub mod feed;
pub mod warnings;

pub use catalog::MetadataCatalog;
pub use cycle::{CycleReport, Failure};
pub use error::{Error, Result};
pub use feed::FeedPipeline;
pub use warnings::WarningPipeline;
