//! Async client for the public warning API.
//!
//! Serves as the summary, detail, catalog and logo source. Non-success
//! statuses are errors here; degrading them to empty results is the
//! pipeline's decision.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use warnwatch_core::{
  announce::{FALLBACK_LOGO_URL, LogoUrls},
  catalog::CatalogEntry,
  source::{CatalogSource, LogoSource, WarningSource},
};

use crate::{Error, Result};

/// Endpoints of the warning API. Templates use `{id}` and `{filename}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WarnApiConfig {
  pub summary_url:       String,
  pub detail_url:        String,
  pub catalog_url:       String,
  pub logo_url:          String,
  pub fallback_logo_url: String,
}

impl Default for WarnApiConfig {
  fn default() -> Self {
    Self {
      summary_url:       "https://warnung.bund.de/api31/mowas/mapData.json".into(),
      detail_url:        "https://warnung.bund.de/api31/warnings/{id}.json".into(),
      catalog_url:       "https://warnung.bund.de/api31/appdata/gsb/logos/logos.json".into(),
      logo_url:          "https://warnung.bund.de/api31/appdata/gsb/logos/{filename}".into(),
      fallback_logo_url: FALLBACK_LOGO_URL.into(),
    }
  }
}

/// Everything but unreserved characters is escaped in a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'.')
  .remove(b'_')
  .remove(b'~');

impl WarnApiConfig {
  pub fn detail_url(&self, id: &str) -> String {
    let id = utf8_percent_encode(id, SEGMENT).to_string();
    self.detail_url.replace("{id}", &id)
  }

  pub fn logo_url(&self, filename: &str) -> String {
    let filename = utf8_percent_encode(filename, SEGMENT).to_string();
    self.logo_url.replace("{filename}", &filename)
  }

  /// The logo settings the announcement builder needs.
  pub fn logo_urls(&self) -> LogoUrls {
    LogoUrls {
      template: self.logo_url.clone(),
      fallback: self.fallback_logo_url.clone(),
    }
  }
}

/// Shape of the catalog listing. Logos are decoded one by one so a broken
/// entry only costs its own sender.
#[derive(Deserialize)]
struct LogoListing {
  #[serde(default)]
  logos: Vec<Value>,
}

impl LogoListing {
  fn into_entries(self) -> Vec<CatalogEntry> {
    self
      .logos
      .into_iter()
      .filter_map(|logo| match CatalogEntry::deserialize(&logo) {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!(error = %e, sender = ?logo.get("senderId"), "skipping malformed catalog entry");
          None
        }
      })
      .collect()
  }
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WarnApiClient {
  client: Client,
  config: WarnApiConfig,
}

impl WarnApiClient {
  pub fn new(client: Client, config: WarnApiConfig) -> Self { Self { client, config } }

  pub fn config(&self) -> &WarnApiConfig { &self.config }

  async fn get(&self, url: &str) -> Result<Response> {
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|source| Error::Request { url: url.to_owned(), source })?;

    if !resp.status().is_success() {
      return Err(Error::Status { url: url.to_owned(), status: resp.status() });
    }
    Ok(resp)
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
    self
      .get(url)
      .await?
      .json()
      .await
      .map_err(|source| Error::Decode { url: url.to_owned(), source })
  }
}

impl WarningSource for WarnApiClient {
  type Error = Error;

  async fn fetch_summaries(&self) -> Result<Vec<Value>> {
    let summaries: Vec<Value> = self.get_json(&self.config.summary_url).await?;
    debug!(count = summaries.len(), "fetched warning summaries");
    Ok(summaries)
  }

  async fn fetch_detail(&self, id: &str) -> Result<Value> {
    let detail = self.get_json(&self.config.detail_url(id)).await?;
    debug!(id, "fetched warning detail");
    Ok(detail)
  }
}

impl CatalogSource for WarnApiClient {
  type Error = Error;

  async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
    let listing: LogoListing = self.get_json(&self.config.catalog_url).await?;
    let listed = listing.logos.len();
    let entries = listing.into_entries();
    debug!(listed, usable = entries.len(), "fetched logo catalog");
    Ok(entries)
  }
}

impl LogoSource for WarnApiClient {
  type Error = Error;

  async fn fetch_logo(&self, filename: &str) -> Result<Vec<u8>> {
    let url = self.config.logo_url(filename);
    let bytes = self
      .get(&url)
      .await?
      .bytes()
      .await
      .map_err(|source| Error::Decode { url: url.clone(), source })?;
    debug!(filename, size = bytes.len(), "fetched logo");
    Ok(bytes.to_vec())
  }
}
