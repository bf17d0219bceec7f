//! Storage traits for records, details, lifecycle state and the catalog.
//!
//! Implemented by storage backends (e.g. `warnwatch-store-sqlite`). The
//! pipeline depends on these abstractions, not on any concrete backend.
//!
//! Records and details are write-once: there is no update or delete. Only
//! the lifecycle state of an id ever changes.

use std::{collections::BTreeSet, future::Future};

use serde_json::Value;

use crate::{catalog::Catalog, catalog::CatalogEntry, lifecycle::LifecycleState};

/// Implemented by backend error types so callers can tell an expected miss
/// from a real fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_not_found(&self) -> bool;
}

// ─── Per-feed ledger ─────────────────────────────────────────────────────────

/// The record store, detail store and lifecycle tracker of one feed.
///
/// Each feed pipeline owns its own ledger; ids of different feeds never
/// collide.
pub trait FeedLedger: Send + Sync {
  type Error: StoreError;

  /// Name of the feed this ledger is scoped to.
  fn feed(&self) -> &str;

  // ── Record store ──────────────────────────────────────────────────────

  /// Insert `payload` under `id` if absent. Returns whether an insert
  /// happened; an existing record is never overwritten.
  fn put_record<'a>(
    &'a self,
    id: &'a str,
    payload: &'a Value,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Fails with a not-found error if `id` was never stored.
  fn get_record<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  fn list_record_ids(
    &self,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;

  /// Store a record and set its lifecycle state to `new` as one step.
  ///
  /// Returns `false` and changes nothing if the record already exists, so
  /// re-admitting never resets an id's state.
  fn admit<'a>(
    &'a self,
    id: &'a str,
    payload: &'a Value,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Detail store ──────────────────────────────────────────────────────

  fn has_detail<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a detail if absent. Returns whether an insert happened.
  fn put_detail<'a>(
    &'a self,
    id: &'a str,
    detail: &'a Value,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn get_detail<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  // ── Lifecycle tracker ─────────────────────────────────────────────────

  /// Overwrite the state of `id` unconditionally.
  ///
  /// Does not check the forward-only chain; use [`FeedLedger::advance`]
  /// for that.
  fn set_state<'a>(
    &'a self,
    id: &'a str,
    state: LifecycleState,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Move `id` one step forward to `to`, atomically.
  ///
  /// Fails with an illegal-transition error unless the current state is
  /// `to`'s predecessor, and with not-found if `id` has no state.
  fn advance<'a>(
    &'a self,
    id: &'a str,
    to: LifecycleState,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_state<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<LifecycleState, Self::Error>> + Send + 'a;

  /// All ids currently at `state`, in admission order, read as one snapshot.
  fn ids_in_state(
    &self,
    state: LifecycleState,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Number of ids per state. States with no ids are omitted.
  fn state_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(LifecycleState, usize)>, Self::Error>> + Send + '_;
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// The wholesale-replaced sender catalog.
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  /// Replace every entry with `entries` in one transaction.
  fn replace_catalog(
    &self,
    entries: Vec<CatalogEntry>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn load_catalog(&self) -> impl Future<Output = Result<Catalog, Self::Error>> + Send + '_;
}
