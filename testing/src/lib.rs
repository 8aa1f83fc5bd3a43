//! # Rollcall Testing
//!
//! Test doubles and fixtures for exercising the partition actor runtime
//! without a database or a websocket transport:
//!
//! - [`InMemoryStore`] — a scripted [`SummaryStore`](rollcall_core::SummaryStore)
//!   with failure injection for load-retry scenarios.
//! - [`RecordingConnection`] — a [`Connection`](rollcall_runtime::Connection)
//!   that records every frame and can be severed to simulate a dead socket.
//! - [`fixtures`] — terse constructors for domain records.

pub mod connection;
pub mod fixtures;
pub mod store;

pub use connection::RecordingConnection;
pub use store::InMemoryStore;
