//! # Rollcall Postgres
//!
//! `PostgreSQL` store for the rollcall system, over sqlx connection pooling.
//! One type, [`PostgresStore`], carries both sides of the store contract:
//!
//! - the read side ([`SummaryStore`](rollcall_core::SummaryStore)) the
//!   partition actors hydrate and query from, and
//! - the write side the fact gateway calls before signaling an actor:
//!   inserts that return the authoritative row (server-assigned ids and
//!   timestamps, joined display names).
//!
//! Schema lives in `migrations/` and is embedded into the binary via
//! `sqlx::migrate!`.

pub mod store;

pub use store::{AdminRecord, PostgresStore};
