//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, payloads compact JSON, lifecycle states
//! their lowercase tag.

use chrono::{DateTime, Utc};
use serde_json::Value;
use warnwatch_core::lifecycle::LifecycleState;

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn now() -> String { encode_dt(Utc::now()) }

pub fn encode_payload(v: &Value) -> Result<String> { Ok(serde_json::to_string(v)?) }

pub fn decode_payload(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }

pub fn encode_state(s: LifecycleState) -> &'static str { s.as_str() }

/// Any tag outside the recognised four is an `InvalidState`, never a
/// silent default.
pub fn decode_state(s: &str) -> Result<LifecycleState> {
  Ok(LifecycleState::parse(s)?)
}
