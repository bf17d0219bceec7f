//! The delivery lifecycle of a record.
//!
//! Every admitted id moves forward along `new → unseen → rewritten → seen`.
//! `seen` is terminal. An id with no lifecycle entry has never been observed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::Error;

/// Delivery state of a single record id.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleState {
  /// Stored, detail not yet fetched.
  New,
  /// Detail fetched, announcement not yet built.
  Unseen,
  /// Announcement built, delivery not yet acknowledged.
  Rewritten,
  /// Delivery acknowledged.
  Seen,
}

impl LifecycleState {
  /// Parse a stored or user-supplied tag, rejecting anything outside the
  /// four recognised values.
  pub fn parse(tag: &str) -> Result<Self, Error> {
    tag.parse().map_err(|_| Error::InvalidState(tag.to_owned()))
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Unseen => "unseen",
      Self::Rewritten => "rewritten",
      Self::Seen => "seen",
    }
  }

  /// The only state that may advance to this one, or `None` for `new`.
  pub fn predecessor(self) -> Option<Self> {
    match self {
      Self::New => None,
      Self::Unseen => Some(Self::New),
      Self::Rewritten => Some(Self::Unseen),
      Self::Seen => Some(Self::Rewritten),
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn tags_roundtrip_through_parse() {
    for state in LifecycleState::iter() {
      assert_eq!(LifecycleState::parse(state.as_str()).unwrap(), state);
      assert_eq!(state.to_string(), state.as_str());
    }
  }

  #[test]
  fn unknown_tag_is_invalid_state() {
    let err = LifecycleState::parse("posted").unwrap_err();
    assert!(matches!(err, Error::InvalidState(ref t) if t == "posted"));
  }

  #[test]
  fn chain_is_ordered() {
    let chain: Vec<_> = LifecycleState::iter().collect();
    assert!(chain.windows(2).all(|w| w[0] < w[1]));
    assert!(chain.windows(2).all(|w| w[1].predecessor() == Some(w[0])));
    assert_eq!(LifecycleState::New.predecessor(), None);
  }
}
