//! Core types and trait definitions for the warnwatch ingestion pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the upstream sources and the delivery channel are all
//! expressed as traits here and implemented elsewhere.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod announce;
pub mod catalog;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod record;
pub mod source;
pub mod store;

pub use error::{Error, Result};
