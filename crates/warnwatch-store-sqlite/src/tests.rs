//! Integration tests for `SqliteStore` against an in-memory database.

use serde_json::json;
use warnwatch_core::{
  Error as CoreError,
  catalog::CatalogEntry,
  lifecycle::LifecycleState,
  store::{CatalogStore, FeedLedger, StoreError},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn summary(id: &str) -> serde_json::Value {
  json!({
    "id": id,
    "version": 1,
    "severity": "Minor",
    "type": "Alert",
    "i18nTitle": { "de": "Test" }
  })
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_record_is_write_once() {
  let s = store().await;
  let ledger = s.ledger("mowas");

  assert!(ledger.put_record("a", &summary("a")).await.unwrap());
  assert!(!ledger.put_record("a", &json!({ "id": "a", "version": 2 })).await.unwrap());

  let stored = ledger.get_record("a").await.unwrap();
  assert_eq!(stored["version"], 1);
  assert_eq!(ledger.list_record_ids().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_record_missing_is_not_found() {
  let s = store().await;
  let err = s.ledger("mowas").get_record("nope").await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn feeds_do_not_share_ids() {
  let s = store().await;
  s.ledger("mowas").admit("a", &summary("a")).await.unwrap();

  let rss = s.ledger("rss");
  assert!(rss.list_record_ids().await.unwrap().is_empty());
  assert!(rss.admit("a", &summary("a")).await.unwrap());
}

// ─── Admission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn admit_sets_new_once() {
  let s = store().await;
  let ledger = s.ledger("mowas");

  assert!(ledger.admit("a", &summary("a")).await.unwrap());
  assert_eq!(ledger.get_state("a").await.unwrap(), LifecycleState::New);

  ledger.advance("a", LifecycleState::Unseen).await.unwrap();

  // Re-admitting is a no-op and does not reset the state.
  assert!(!ledger.admit("a", &summary("a")).await.unwrap());
  assert_eq!(ledger.get_state("a").await.unwrap(), LifecycleState::Unseen);
  assert_eq!(ledger.list_record_ids().await.unwrap().len(), 1);
}

#[tokio::test]
async fn every_admitted_record_has_a_state() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  for id in ["a", "b", "c"] {
    ledger.admit(id, &summary(id)).await.unwrap();
  }
  for id in ledger.list_record_ids().await.unwrap() {
    assert!(ledger.get_state(&id).await.is_ok());
  }
}

// ─── Details ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn details_are_write_once() {
  let s = store().await;
  let ledger = s.ledger("mowas");

  assert!(!ledger.has_detail("a").await.unwrap());
  assert!(ledger.put_detail("a", &json!({})).await.unwrap());
  assert!(!ledger.put_detail("a", &json!({ "sender": "x" })).await.unwrap());
  assert!(ledger.has_detail("a").await.unwrap());
  assert_eq!(ledger.get_detail("a").await.unwrap(), json!({}));
}

#[tokio::test]
async fn get_detail_missing_is_not_found() {
  let s = store().await;
  let err = s.ledger("mowas").get_detail("a").await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NotFound { table: "details", .. })));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_state_overwrites_unconditionally() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  ledger.admit("a", &summary("a")).await.unwrap();

  ledger.set_state("a", LifecycleState::Seen).await.unwrap();
  ledger.set_state("a", LifecycleState::New).await.unwrap();
  assert_eq!(ledger.get_state("a").await.unwrap(), LifecycleState::New);
}

#[tokio::test]
async fn get_state_missing_is_not_found() {
  let s = store().await;
  let err = s.ledger("mowas").get_state("ghost").await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn advance_walks_the_chain() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  ledger.admit("a", &summary("a")).await.unwrap();

  for to in [LifecycleState::Unseen, LifecycleState::Rewritten, LifecycleState::Seen] {
    ledger.advance("a", to).await.unwrap();
    assert_eq!(ledger.get_state("a").await.unwrap(), to);
  }
}

#[tokio::test]
async fn advance_rejects_skip_and_reversal() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  ledger.admit("a", &summary("a")).await.unwrap();

  let err = ledger.advance("a", LifecycleState::Seen).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::IllegalTransition { from: LifecycleState::New, .. })
  ));
  assert_eq!(ledger.get_state("a").await.unwrap(), LifecycleState::New);

  let err = ledger.advance("a", LifecycleState::New).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::IllegalTransition { .. })));
}

#[tokio::test]
async fn advance_missing_is_not_found() {
  let s = store().await;
  let err = s
    .ledger("mowas")
    .advance("ghost", LifecycleState::Unseen)
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn ids_in_state_follow_admission_order() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  for id in ["c", "a", "b"] {
    ledger.admit(id, &summary(id)).await.unwrap();
  }
  ledger.advance("a", LifecycleState::Unseen).await.unwrap();

  assert_eq!(ledger.ids_in_state(LifecycleState::New).await.unwrap(), ["c", "b"]);
  assert_eq!(ledger.ids_in_state(LifecycleState::Unseen).await.unwrap(), ["a"]);
  assert!(ledger.ids_in_state(LifecycleState::Seen).await.unwrap().is_empty());
}

#[tokio::test]
async fn state_counts_group_by_state() {
  let s = store().await;
  let ledger = s.ledger("mowas");
  for id in ["a", "b", "c"] {
    ledger.admit(id, &summary(id)).await.unwrap();
  }
  ledger.advance("a", LifecycleState::Unseen).await.unwrap();

  let counts = ledger.state_counts().await.unwrap();
  assert_eq!(
    counts,
    vec![(LifecycleState::New, 2), (LifecycleState::Unseen, 1)]
  );
}

#[tokio::test]
async fn state_survives_reopen() {
  let dir = std::env::temp_dir().join(format!("warnwatch-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    let ledger = s.ledger("mowas");
    ledger.admit("a", &summary("a")).await.unwrap();
    ledger.advance("a", LifecycleState::Unseen).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(
    s.ledger("mowas").get_state("a").await.unwrap(),
    LifecycleState::Unseen
  );
  std::fs::remove_dir_all(&dir).ok();
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

fn entry(sender: &str, name: &str) -> CatalogEntry {
  CatalogEntry {
    sender_id:     sender.into(),
    display_name:  name.into(),
    logo_filename: format!("{sender}.png"),
  }
}

#[tokio::test]
async fn replace_catalog_swaps_everything() {
  let s = store().await;
  s.replace_catalog(vec![entry("a", "A"), entry("b", "B")]).await.unwrap();
  s.replace_catalog(vec![entry("c", "C")]).await.unwrap();

  let catalog = s.load_catalog().await.unwrap();
  assert_eq!(catalog.len(), 1);
  assert!(catalog.lookup("a").is_none());
  assert_eq!(catalog.lookup("c").unwrap().display_name, "C");
}

#[tokio::test]
async fn replace_catalog_is_idempotent() {
  let s = store().await;
  let input = vec![entry("a", "A"), entry("b", "B")];
  s.replace_catalog(input.clone()).await.unwrap();
  let first = s.load_catalog().await.unwrap();
  s.replace_catalog(input).await.unwrap();
  assert_eq!(s.load_catalog().await.unwrap(), first);
}
