//! HTTP adapters for warnwatch.
//!
//! Implements the source traits of `warnwatch-core` against the public
//! warning API and an RSS feed, and the delivery trait against a chat
//! webhook. Everything here is I/O; the pipeline never sees `reqwest`.

pub mod client;
pub mod error;
pub mod rss;
pub mod webhook;

pub use client::{WarnApiClient, WarnApiConfig};
pub use error::{Error, Result};
pub use rss::RssFeedClient;
pub use webhook::WebhookDelivery;

use std::time::Duration;

use reqwest::Client;

/// Build the shared HTTP client. Cheap to clone; reuse it across adapters.
pub fn http_client(timeout: Duration) -> Result<Client> {
  Client::builder()
    .timeout(timeout)
    .user_agent(concat!("warnwatch/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(Error::Build)
}
