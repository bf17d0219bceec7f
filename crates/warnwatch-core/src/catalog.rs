//! Sender metadata: display names and logo files keyed by sender id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One sender's presentation metadata, as listed by the logo catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  #[serde(rename = "senderId")]
  pub sender_id:     String,
  #[serde(rename = "name")]
  pub display_name:  String,
  #[serde(rename = "image")]
  pub logo_filename: String,
}

/// An immutable snapshot of the catalog.
///
/// Built in full before it is handed out; a refresh produces a new snapshot
/// rather than editing this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
  entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
  /// Build a snapshot. A later entry for the same sender replaces an earlier
  /// one.
  pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
    let entries = entries
      .into_iter()
      .map(|e| (e.sender_id.clone(), e))
      .collect();
    Self { entries }
  }

  pub fn lookup(&self, sender_id: &str) -> Option<&CatalogEntry> {
    self.entries.get(sender_id)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
