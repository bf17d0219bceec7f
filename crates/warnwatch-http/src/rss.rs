//! RSS 2.0 source exposing the newest item of a feed.
//!
//! Items are mapped onto [`FeedEntry`]: `guid` (or `link` when there is no
//! guid) becomes the id, `description` the summary, `pubDate` the published
//! date.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use warnwatch_core::{feed::FeedEntry, source::FeedSource};

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Rss {
  channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
  #[serde(rename = "item", default)]
  items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
  title:       Option<String>,
  link:        Option<String>,
  description: Option<String>,
  #[serde(rename = "pubDate")]
  pub_date:    Option<String>,
  guid:        Option<Guid>,
}

#[derive(Debug, Deserialize)]
struct Guid {
  #[serde(rename = "$text")]
  value: String,
}

impl Item {
  fn into_entry(self) -> Option<FeedEntry> {
    let id = self
      .guid
      .map(|g| g.value.trim().to_owned())
      .filter(|g| !g.is_empty())
      .or_else(|| self.link.clone())?;
    Some(FeedEntry {
      id,
      title: self.title.unwrap_or_default(),
      summary: self.description.unwrap_or_default(),
      published: self.pub_date?,
      link: self.link,
    })
  }
}

/// Parse an RSS document and return its first item.
///
/// An item with neither guid nor link, or without a `pubDate`, cannot be
/// tracked and is treated as no entry.
pub fn parse_latest(xml: &str) -> Result<Option<FeedEntry>> {
  let rss: Rss = quick_xml::de::from_str(xml)?;
  let Some(first) = rss.channel.items.into_iter().next() else {
    return Ok(None);
  };
  let entry = first.into_entry();
  if entry.is_none() {
    warn!("latest feed item has no usable id or date");
  }
  Ok(entry)
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RssFeedClient {
  client: Client,
  url:    String,
}

impl RssFeedClient {
  pub fn new(client: Client, url: impl Into<String>) -> Self {
    Self { client, url: url.into() }
  }
}

impl FeedSource for RssFeedClient {
  type Error = Error;

  async fn fetch_latest(&self) -> Result<Option<FeedEntry>> {
    let resp = self
      .client
      .get(&self.url)
      .send()
      .await
      .map_err(|source| Error::Request { url: self.url.clone(), source })?;

    if !resp.status().is_success() {
      return Err(Error::Status { url: self.url.clone(), status: resp.status() });
    }

    let body = resp
      .text()
      .await
      .map_err(|source| Error::Decode { url: self.url.clone(), source })?;
    let entry = parse_latest(&body)?;
    debug!(url = %self.url, id = ?entry.as_ref().map(|e| &e.id), "fetched feed");
    Ok(entry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Warnungen Kiel</title>
    <link>https://warnung.bund.de</link>
    <description>Aktuelle Meldungen</description>
    <item>
      <title>Sturmböen</title>
      <link>https://warnung.bund.de/meldungen/dwd.1</link>
      <description>Es treten Sturmböen auf. --- Deutscher Wetterdienst</description>
      <pubDate>Fri, 20 Oct 2023 09:53:22 +0200</pubDate>
      <guid isPermaLink="false">dwd.2.49.0.0.276.0.DWD.PVW.1</guid>
    </item>
    <item>
      <title>Älter</title>
      <link>https://warnung.bund.de/meldungen/dwd.0</link>
      <pubDate>Thu, 19 Oct 2023 09:00:00 +0200</pubDate>
      <guid>dwd.0</guid>
    </item>
  </channel>
</rss>"#;

  #[test]
  fn first_item_is_latest() {
    let entry = parse_latest(FEED).unwrap().unwrap();
    assert_eq!(entry.id, "dwd.2.49.0.0.276.0.DWD.PVW.1");
    assert_eq!(entry.title, "Sturmböen");
    assert_eq!(entry.published, "Fri, 20 Oct 2023 09:53:22 +0200");
    assert_eq!(entry.link.as_deref(), Some("https://warnung.bund.de/meldungen/dwd.1"));
  }

  #[test]
  fn link_stands_in_for_missing_guid() {
    let xml = r#"<rss><channel><item>
      <title>t</title>
      <link>https://example.org/1</link>
      <pubDate>Fri, 20 Oct 2023 09:53:22 +0200</pubDate>
    </item></channel></rss>"#;
    assert_eq!(parse_latest(xml).unwrap().unwrap().id, "https://example.org/1");
  }

  #[test]
  fn empty_channel_has_no_entry() {
    let xml = "<rss><channel><title>leer</title></channel></rss>";
    assert!(parse_latest(xml).unwrap().is_none());
  }

  #[test]
  fn garbage_is_an_error() {
    assert!(parse_latest("<html><body>503</body></html>").is_err());
  }
}
