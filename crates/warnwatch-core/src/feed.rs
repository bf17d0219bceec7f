//! Single-entry syndication feed: entry shape and its announcement.
//!
//! The feed only ever exposes its latest entry. The entry is both the stored
//! record and its own detail, so no separate fetch is needed.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, announce::Announcement};

/// One syndication entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
  pub id:        String,
  pub title:     String,
  #[serde(default)]
  pub summary:   String,
  /// RFC 2822 date, e.g. `Fri, 20 Oct 2023 09:53:22 +0200`.
  pub published: String,
  #[serde(default)]
  pub link:      Option<String>,
}

/// The organisation credited for a feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAuthor {
  pub name: &'static str,
  pub logo: &'static str,
  pub url:  &'static str,
}

pub const MARITIME_AGENCY: FeedAuthor = FeedAuthor {
  name: "Bundesamt für Seeschifffahrt und Hydrographie",
  logo: "https://upload.wikimedia.org/wikipedia/commons/thumb/9/95/BSH-Logo.svg/512px-BSH-Logo.svg.png",
  url:  "https://www.bsh.de/aktdat/wvd/sturm/",
};

pub const WEATHER_SERVICE: FeedAuthor = FeedAuthor {
  name: "Deutscher Wetterdienst",
  logo: "https://www.dwd.de/DE/service/copyright/dwd-logo-png.png?__blob=publicationFile&v=4",
  url:  "https://www.dwd.de/DE/Home/home_node.html",
};

pub const CIVIL_PROTECTION: FeedAuthor = FeedAuthor {
  name: "Bundesamt für Bevölkerungsschutz und Katastrophenhilfe",
  logo: crate::announce::FALLBACK_LOGO_URL,
  url:  "https://www.bbk.bund.de/DE/Home/home_node.html",
};

/// Pick the author from the entry text. Civil protection is the default.
pub fn extract_author(summary: &str) -> &'static FeedAuthor {
  if summary.contains(MARITIME_AGENCY.name) {
    &MARITIME_AGENCY
  } else if summary.contains("DWD") || summary.contains(WEATHER_SERVICE.name) {
    &WEATHER_SERVICE
  } else {
    &CIVIL_PROTECTION
  }
}

/// Summary text before the first `---` separator, trimmed.
pub fn trim_summary(summary: &str) -> &str {
  summary
    .split_once("---")
    .map_or(summary, |(head, _)| head)
    .trim()
}

pub fn parse_published(input: &str) -> Result<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc2822(input.trim()).map_err(|e| Error::MalformedTimestamp {
    input:  input.to_owned(),
    reason: e.to_string(),
  })
}

/// Build the announcement for a feed entry. Pure, like
/// [`build_announcement`](crate::announce::build_announcement).
pub fn build_feed_announcement(entry: &FeedEntry) -> Result<Announcement> {
  let author = extract_author(&entry.summary);
  Ok(Announcement {
    id:           entry.id.clone(),
    title:        entry.title.clone(),
    description:  trim_summary(&entry.summary).to_owned(),
    location:     String::new(),
    display_time: parse_published(&entry.published)?,
    logo_url:     author.logo.to_owned(),
    author_name:  author.name.to_owned(),
    author_url:   Some(author.url.to_owned()),
    link:         entry.link.clone(),
  })
}
