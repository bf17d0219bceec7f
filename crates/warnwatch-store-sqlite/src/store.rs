//! [`SqliteStore`] and its per-feed [`FeedStore`] view.

use std::{collections::BTreeSet, path::Path, sync::Arc};

use rusqlite::OptionalExtension as _;
use serde_json::Value;
use tracing::debug;

use warnwatch_core::{
  catalog::{Catalog, CatalogEntry},
  lifecycle::LifecycleState,
  store::{CatalogStore, FeedLedger},
};

use crate::{
  Result,
  encode::{decode_payload, decode_state, encode_payload, encode_state, now},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A warnwatch store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The ledger of `feed`. All handles share one connection.
  pub fn ledger(&self, feed: impl Into<String>) -> FeedStore {
    FeedStore { conn: self.conn.clone(), feed: Arc::from(feed.into()) }
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = crate::Error;

  async fn replace_catalog(&self, entries: Vec<CatalogEntry>) -> Result<()> {
    let count = entries.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM catalog", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO catalog (sender_id, display_name, logo_filename)
             VALUES (?1, ?2, ?3)",
          )?;
          for e in &entries {
            stmt.execute(rusqlite::params![e.sender_id, e.display_name, e.logo_filename])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(entries = count, "catalog replaced");
    Ok(())
  }

  async fn load_catalog(&self) -> Result<Catalog> {
    let entries: Vec<CatalogEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT sender_id, display_name, logo_filename FROM catalog ORDER BY sender_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(CatalogEntry {
              sender_id:     row.get(0)?,
              display_name:  row.get(1)?,
              logo_filename: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(Catalog::from_entries(entries))
  }
}

// ─── Feed ledger ─────────────────────────────────────────────────────────────

/// The records, details and lifecycle rows of one feed.
#[derive(Clone)]
pub struct FeedStore {
  conn: tokio_rusqlite::Connection,
  feed: Arc<str>,
}

/// What an `advance` found inside its transaction.
enum AdvanceOutcome {
  Done,
  Missing,
  Rejected(String),
}

fn illegal(id: &str, from: LifecycleState, to: LifecycleState) -> crate::Error {
  warnwatch_core::Error::IllegalTransition { id: id.to_owned(), from, to }.into()
}

impl FeedStore {
  async fn insert_if_absent(&self, table: &'static str, id: &str, payload: &Value) -> Result<bool> {
    let feed    = self.feed.to_string();
    let id      = id.to_owned();
    let payload = encode_payload(payload)?;
    let at      = now();

    let inserted = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT OR IGNORE INTO {table} (feed, id, payload, {}) VALUES (?1, ?2, ?3, ?4)",
          if table == "records" { "stored_at" } else { "fetched_at" }
        );
        let n = conn.execute(&sql, rusqlite::params![feed, id, payload, at])?;
        Ok(n == 1)
      })
      .await?;
    Ok(inserted)
  }

  async fn get_payload(&self, table: &'static str, id: &str) -> Result<Value> {
    let feed   = self.feed.to_string();
    let id_str = id.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT payload FROM {table} WHERE feed = ?1 AND id = ?2");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![feed, id_str], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(s) => decode_payload(&s),
      None => Err(warnwatch_core::Error::not_found(table, id).into()),
    }
  }
}

impl FeedLedger for FeedStore {
  type Error = crate::Error;

  fn feed(&self) -> &str { &self.feed }

  // ── Record store ──────────────────────────────────────────────────────────

  async fn put_record(&self, id: &str, payload: &Value) -> Result<bool> {
    self.insert_if_absent("records", id, payload).await
  }

  async fn get_record(&self, id: &str) -> Result<Value> {
    self.get_payload("records", id).await
  }

  async fn list_record_ids(&self) -> Result<BTreeSet<String>> {
    let feed = self.feed.to_string();
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT id FROM records WHERE feed = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![feed], |r| r.get(0))?
          .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn admit(&self, id: &str, payload: &Value) -> Result<bool> {
    let feed    = self.feed.to_string();
    let id_str  = id.to_owned();
    let payload = encode_payload(payload)?;
    let at      = now();
    let initial = encode_state(LifecycleState::New);

    let admitted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "INSERT OR IGNORE INTO records (feed, id, payload, stored_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![feed, id_str, payload, at],
        )?;
        if n == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO lifecycle (feed, id, state, updated_at) VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (feed, id) DO UPDATE SET state = excluded.state,
                                               updated_at = excluded.updated_at",
          rusqlite::params![feed, id_str, initial, at],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if admitted {
      debug!(feed = %self.feed, id, "admitted");
    }
    Ok(admitted)
  }

  // ── Detail store ──────────────────────────────────────────────────────────

  async fn has_detail(&self, id: &str) -> Result<bool> {
    let feed = self.feed.to_string();
    let id   = id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM details WHERE feed = ?1 AND id = ?2",
              rusqlite::params![feed, id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn put_detail(&self, id: &str, detail: &Value) -> Result<bool> {
    self.insert_if_absent("details", id, detail).await
  }

  async fn get_detail(&self, id: &str) -> Result<Value> {
    self.get_payload("details", id).await
  }

  // ── Lifecycle tracker ─────────────────────────────────────────────────────

  async fn set_state(&self, id: &str, state: LifecycleState) -> Result<()> {
    let feed   = self.feed.to_string();
    let id_str = id.to_owned();
    let tag    = encode_state(state);
    let at     = now();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO lifecycle (feed, id, state, updated_at) VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (feed, id) DO UPDATE SET state = excluded.state,
                                               updated_at = excluded.updated_at",
          rusqlite::params![feed, id_str, tag, at],
        )?;
        Ok(())
      })
      .await?;
    debug!(feed = %self.feed, id, state = %state, "state set");
    Ok(())
  }

  async fn advance(&self, id: &str, to: LifecycleState) -> Result<()> {
    // `new` is only ever entered through admission.
    let Some(from) = to.predecessor() else {
      let from = self.get_state(id).await?;
      return Err(illegal(id, from, to));
    };

    let feed     = self.feed.to_string();
    let id_str   = id.to_owned();
    let from_tag = encode_state(from);
    let to_tag   = encode_state(to);
    let at       = now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT state FROM lifecycle WHERE feed = ?1 AND id = ?2",
            rusqlite::params![feed, id_str],
            |r| r.get(0),
          )
          .optional()?;
        let outcome = match current {
          None => AdvanceOutcome::Missing,
          Some(tag) if tag != from_tag => AdvanceOutcome::Rejected(tag),
          Some(_) => {
            tx.execute(
              "UPDATE lifecycle SET state = ?3, updated_at = ?4 WHERE feed = ?1 AND id = ?2",
              rusqlite::params![feed, id_str, to_tag, at],
            )?;
            AdvanceOutcome::Done
          }
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match outcome {
      AdvanceOutcome::Done => {
        debug!(feed = %self.feed, id, %from, %to, "advanced");
        Ok(())
      }
      AdvanceOutcome::Missing => Err(warnwatch_core::Error::not_found("lifecycle", id).into()),
      AdvanceOutcome::Rejected(tag) => {
        Err(illegal(id, decode_state(&tag)?, to))
      }
    }
  }

  async fn get_state(&self, id: &str) -> Result<LifecycleState> {
    let feed   = self.feed.to_string();
    let id_str = id.to_owned();
    let tag: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT state FROM lifecycle WHERE feed = ?1 AND id = ?2",
              rusqlite::params![feed, id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match tag {
      Some(tag) => decode_state(&tag),
      None => Err(warnwatch_core::Error::not_found("lifecycle", id).into()),
    }
  }

  async fn ids_in_state(&self, state: LifecycleState) -> Result<Vec<String>> {
    let feed = self.feed.to_string();
    let tag  = encode_state(state);
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id FROM lifecycle WHERE feed = ?1 AND state = ?2 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![feed, tag], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn state_counts(&self) -> Result<Vec<(LifecycleState, usize)>> {
    let feed = self.feed.to_string();
    let raws: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT state, COUNT(*) FROM lifecycle WHERE feed = ?1 GROUP BY state",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![feed], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts = raws
      .into_iter()
      .map(|(tag, n)| Ok((decode_state(&tag)?, n as usize)))
      .collect::<Result<Vec<_>>>()?;
    counts.sort_by_key(|(state, _)| *state);
    Ok(counts)
  }
}
