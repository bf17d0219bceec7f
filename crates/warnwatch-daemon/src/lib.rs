//! Wiring for the `warnwatch` daemon.
//!
//! Turns a [`DaemonConfig`] into a store, the two pipelines and a delivery
//! channel, and runs the pipelines on their interval until shutdown.

pub mod delivery;
pub mod runner;

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use warnwatch_http::{RssFeedClient, WarnApiClient, WarnApiConfig};
use warnwatch_pipeline::{FeedPipeline, MetadataCatalog, WarningPipeline};
use warnwatch_store_sqlite::{FeedStore, SqliteStore};

pub use delivery::{AnyDelivery, DeliveryConfig, DeliveryKind, LogDelivery};

/// Ledger name of the primary warning feed.
pub const WARNINGS_FEED: &str = "mowas";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `warnwatch.toml` and the
/// `WARNWATCH_*` environment.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DaemonConfig {
  pub store_path:           PathBuf,
  /// Pause between two cycles of the same feed.
  pub interval_secs:        u64,
  pub catalog_refresh_secs: u64,
  pub warnings:             WarnApiConfig,
  pub feed:                 FeedConfig,
  pub delivery:             DeliveryConfig,
}

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      store_path:           PathBuf::from("warnwatch.db"),
      interval_secs:        60,
      catalog_refresh_secs: 24 * 60 * 60,
      warnings:             WarnApiConfig::default(),
      feed:                 FeedConfig::default(),
      delivery:             DeliveryConfig::default(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
  pub enabled: bool,
  /// Ledger name; ids are only deduplicated within one name.
  pub name:    String,
  pub url:     String,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      name:    "rss".into(),
      url:     "https://warnung.bund.de/api31/mowas/rss/033520000000.rss".into(),
    }
  }
}

impl DaemonConfig {
  /// Layer the optional file at `path` under `WARNWATCH_*` variables
  /// (nested keys joined with `__`, e.g. `WARNWATCH_DELIVERY__KIND`).
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("WARNWATCH")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise DaemonConfig")
  }

  pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }

  pub fn catalog_max_age(&self) -> Duration { Duration::from_secs(self.catalog_refresh_secs) }

  pub fn http_timeout(&self) -> Duration { Duration::from_secs(self.delivery.timeout_secs) }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

pub type Warnings = WarningPipeline<FeedStore, SqliteStore, WarnApiClient>;
pub type Feed = FeedPipeline<FeedStore, RssFeedClient>;

/// Open the SQLite store, expanding a leading `~` in its path.
pub async fn open_store(config: &DaemonConfig) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(&config.store_path);
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

pub async fn warning_pipeline(
  config: &DaemonConfig,
  store: &SqliteStore,
  client: reqwest::Client,
) -> anyhow::Result<Warnings> {
  let catalog = MetadataCatalog::load(store.clone(), config.catalog_max_age())
    .await
    .context("failed to load catalog")?;
  let api = WarnApiClient::new(client, config.warnings.clone());
  Ok(WarningPipeline::new(
    store.ledger(WARNINGS_FEED),
    catalog,
    api,
    config.warnings.logo_urls(),
  ))
}

/// The single-entry feed pipeline, or `None` when disabled.
pub fn feed_pipeline(
  config: &DaemonConfig,
  store: &SqliteStore,
  client: reqwest::Client,
) -> Option<Feed> {
  config.feed.enabled.then(|| {
    FeedPipeline::new(
      store.ledger(config.feed.name.clone()),
      RssFeedClient::new(client, config.feed.url.clone()),
    )
  })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  fn from_toml(toml: &str) -> DaemonConfig {
    config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.interval(), Duration::from_secs(60));
    assert_eq!(cfg.feed.name, "rss");
    assert!(cfg.feed.enabled);
    assert_eq!(cfg.delivery.kind, DeliveryKind::Log);
    assert_eq!(cfg.warnings, WarnApiConfig::default());
  }

  #[test]
  fn nested_keys_override() {
    let cfg = from_toml(
      r#"
      interval_secs = 120
      [warnings]
      summary_url = "http://localhost:8080/mapData.json"
      [feed]
      enabled = false
      [delivery]
      kind = "webhook"
      webhook_url = "https://chat.example.org/hook"
      "#,
    );
    assert_eq!(cfg.interval_secs, 120);
    assert_eq!(cfg.warnings.summary_url, "http://localhost:8080/mapData.json");
    assert_eq!(cfg.warnings.detail_url, WarnApiConfig::default().detail_url);
    assert!(!cfg.feed.enabled);
    assert_eq!(cfg.delivery.kind, DeliveryKind::Webhook);
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/warnwatch.db")),
      PathBuf::from(home).join("warnwatch.db")
    );
    assert_eq!(expand_tilde(Path::new("/var/lib/w.db")), PathBuf::from("/var/lib/w.db"));
  }
}
