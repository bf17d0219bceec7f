//! Upstream warning records and their details.
//!
//! Both shapes are immutable once stored. The stores keep the upstream JSON
//! verbatim; the typed views here are decoded on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

// ─── Summary record ──────────────────────────────────────────────────────────

/// One entry of the summary list. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id:         String,
  #[serde(default)]
  pub version:    i64,
  #[serde(rename = "startDate", default)]
  pub start_date: Option<String>,
  #[serde(default)]
  pub severity:   Option<String>,
  #[serde(default)]
  pub urgency:    Option<String>,
  /// Upstream message type, e.g. `Alert`, `Update`, `Cancel`.
  #[serde(rename = "type", default)]
  pub kind:       Option<String>,
  /// Title per locale (`i18nTitle` upstream).
  #[serde(rename = "i18nTitle", default)]
  pub titles:     BTreeMap<String, String>,
  /// The full upstream object, including fields not modelled above.
  #[serde(skip)]
  pub raw:        Value,
}

impl Record {
  /// Decode a summary entry, keeping the original object in `raw`.
  ///
  /// Only `id` is required. When another field has an unexpected shape the
  /// typed fields are left empty and the entry is still usable by id.
  pub fn from_raw(raw: Value) -> Result<Self> {
    let record = match Record::deserialize(&raw) {
      Ok(record) => record,
      Err(e) => {
        let id = raw.get("id").and_then(Value::as_str).ok_or(e)?;
        Record::bare(id)
      }
    };
    Ok(Record { raw, ..record })
  }

  fn bare(id: &str) -> Self {
    Record {
      id:         id.to_owned(),
      version:    0,
      start_date: None,
      severity:   None,
      urgency:    None,
      kind:       None,
      titles:     BTreeMap::new(),
      raw:        Value::Null,
    }
  }
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// Extended information for a record, fetched lazily by id.
///
/// Every field is defaulted: a failed retrieval is stored as `{}` and decodes
/// to an empty detail, which the announcement builder rejects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detail {
  #[serde(default)]
  pub identifier: Option<String>,
  #[serde(default)]
  pub sender:     Option<String>,
  /// `YYYY-MM-DDTHH:MM:SS±HH:MM`
  #[serde(default)]
  pub sent:       Option<String>,
  #[serde(default)]
  pub info:       Vec<InfoBlock>,
}

/// One localized info block of a detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoBlock {
  #[serde(default)]
  pub language:    Option<String>,
  #[serde(default)]
  pub headline:    Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub area:        Vec<Area>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
  #[serde(rename = "areaDesc", default)]
  pub area_desc: Option<String>,
}

impl Detail {
  pub fn from_raw(raw: &Value) -> Result<Self> { Ok(Detail::deserialize(raw)?) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn summary_keeps_raw_and_renamed_fields() {
    let raw = json!({
      "id": "mow.DE-NW-PB-SE093-20230910-93-000",
      "version": 5,
      "startDate": "2023-09-10T12:56:19+02:00",
      "severity": "Minor",
      "urgency": "Immediate",
      "type": "Alert",
      "i18nTitle": { "de": "Blaualgen im Lippesee - Lippesee" },
      "transKeys": { "event": "BBK-EVC-081" }
    });
    let record = Record::from_raw(raw.clone()).unwrap();
    assert_eq!(record.version, 5);
    assert_eq!(record.kind.as_deref(), Some("Alert"));
    assert_eq!(record.titles["de"], "Blaualgen im Lippesee - Lippesee");
    assert_eq!(record.raw, raw);
  }

  #[test]
  fn summary_without_id_is_rejected() {
    assert!(Record::from_raw(json!({ "version": 1 })).is_err());
    assert!(Record::from_raw(json!({ "id": 7, "version": 1 })).is_err());
  }

  #[test]
  fn odd_field_types_keep_the_id() {
    let raw = json!({
      "id": "mow.DE-TEST-1",
      "version": "5",
      "i18nTitle": { "de": null }
    });
    let record = Record::from_raw(raw.clone()).unwrap();
    assert_eq!(record.id, "mow.DE-TEST-1");
    assert_eq!(record.version, 0);
    assert!(record.titles.is_empty());
    assert_eq!(record.raw, raw);
  }

  #[test]
  fn empty_object_decodes_to_empty_detail() {
    let detail = Detail::from_raw(&json!({})).unwrap();
    assert_eq!(detail, Detail::default());
    assert!(detail.info.is_empty());
  }
}
