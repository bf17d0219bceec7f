//! SQL schema for the warnwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Records are write-once.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS records (
    feed       TEXT NOT NULL,
    id         TEXT NOT NULL,
    payload    TEXT NOT NULL,   -- upstream JSON, verbatim
    stored_at  TEXT NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (feed, id)
);

-- Details are write-once as well; a failed fetch is stored as '{}'.
CREATE TABLE IF NOT EXISTS details (
    feed       TEXT NOT NULL,
    id         TEXT NOT NULL,
    payload    TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    PRIMARY KEY (feed, id)
);

-- The only mutable per-id table.
CREATE TABLE IF NOT EXISTS lifecycle (
    feed       TEXT NOT NULL,
    id         TEXT NOT NULL,
    state      TEXT NOT NULL CHECK (state IN ('new', 'unseen', 'rewritten', 'seen')),
    updated_at TEXT NOT NULL,
    PRIMARY KEY (feed, id)
);

-- Replaced wholesale on every catalog refresh.
CREATE TABLE IF NOT EXISTS catalog (
    sender_id     TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL,
    logo_filename TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS lifecycle_state_idx ON lifecycle(feed, state);

PRAGMA user_version = 1;
";
