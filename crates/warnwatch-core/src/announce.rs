//! The announcement builder.
//!
//! A pure transform from a stored [`Detail`] plus a [`Catalog`] snapshot to
//! the channel-independent [`Announcement`] shape. No clock, no I/O: the
//! same inputs always produce the same output.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::Catalog,
  record::Detail,
};

/// Logo of the generic civil-protection sign, used for unknown senders.
pub const FALLBACK_LOGO_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/5/5b/Zivilschutzzeichen.svg/256px-Zivilschutzzeichen.svg.png";

/// Where catalog logo files are served from; `{filename}` is substituted.
pub const DEFAULT_LOGO_URL_TEMPLATE: &str =
  "https://warnung.bund.de/api31/appdata/gsb/logos/{filename}";

/// The only timestamp layout accepted for a detail's `sent` field.
pub const SENT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

// ─── Announcement ────────────────────────────────────────────────────────────

/// Display-ready projection of a record. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
  pub id:           String,
  pub title:        String,
  pub description:  String,
  pub location:     String,
  pub display_time: DateTime<FixedOffset>,
  pub logo_url:     String,
  pub author_name:  String,
  /// Homepage of the author, when known.
  #[serde(default)]
  pub author_url:   Option<String>,
  /// Link to the original entry, when the source provides one.
  #[serde(default)]
  pub link:         Option<String>,
}

/// How logo references are turned into URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoUrls {
  /// URL template containing `{filename}`.
  pub template: String,
  /// Used verbatim when the sender is not in the catalog.
  pub fallback: String,
}

impl Default for LogoUrls {
  fn default() -> Self {
    Self {
      template: DEFAULT_LOGO_URL_TEMPLATE.to_owned(),
      fallback: FALLBACK_LOGO_URL.to_owned(),
    }
  }
}

impl LogoUrls {
  pub fn resolve(&self, filename: &str) -> String {
    self.template.replace("{filename}", filename)
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the announcement for `id`.
///
/// Fails with [`Error::MissingDetail`] when no detail is stored, when it has
/// no sender, or when it carries no info block with a headline, and with
/// [`Error::MalformedTimestamp`] when `sent` does not parse.
pub fn build_announcement(
  id: &str,
  detail: Option<&Detail>,
  catalog: &Catalog,
  logos: &LogoUrls,
) -> Result<Announcement> {
  let missing = |reason| Error::MissingDetail { id: id.to_owned(), reason };

  let detail = detail.ok_or_else(|| missing("no detail stored"))?;
  let info = detail.info.first().ok_or_else(|| missing("no info block"))?;
  let title = info
    .headline
    .clone()
    .ok_or_else(|| missing("info block has no headline"))?;
  let sender = detail
    .sender
    .as_deref()
    .ok_or_else(|| missing("no sender"))?;

  let (logo_url, author_name) = match catalog.lookup(sender) {
    Some(entry) => (logos.resolve(&entry.logo_filename), entry.display_name.clone()),
    None => (logos.fallback.clone(), sender.to_owned()),
  };

  let location = info
    .area
    .first()
    .and_then(|a| a.area_desc.clone())
    .unwrap_or_default();

  let display_time = parse_sent(detail.sent.as_deref().unwrap_or_default())?;

  Ok(Announcement {
    id: id.to_owned(),
    title,
    description: normalize_description(info.description.as_deref().unwrap_or_default()),
    location,
    display_time,
    logo_url,
    author_name,
    author_url: None,
    link: None,
  })
}

/// Replace literal `<br/>` markers with newlines.
pub fn normalize_description(raw: &str) -> String { raw.replace("<br/>", "\n") }

/// Parse `YYYY-MM-DDTHH:MM:SS±HH:MM`. A `Z` designator is not accepted.
pub fn parse_sent(input: &str) -> Result<DateTime<FixedOffset>> {
  let malformed = |reason: String| Error::MalformedTimestamp {
    input: input.to_owned(),
    reason,
  };
  if input.ends_with('Z') || input.ends_with('z') {
    return Err(malformed("zone designator Z is not supported".into()));
  }
  DateTime::parse_from_str(input, SENT_FORMAT).map_err(|e| malformed(e.to_string()))
}
