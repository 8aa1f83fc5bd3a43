//! # Rollcall Web
//!
//! The fact gateway: the only process boundary in front of the partition
//! actors. It owns everything the actors must never see —
//!
//! - durable writes (insert first, signal the actor only after commit),
//! - authentication (JWT session cookies, PBKDF2 password verification),
//!   resolved down to a plain [`Role`](rollcall_core::Role) before anything
//!   crosses into the runtime,
//! - the WebSocket transport that turns a socket into a
//!   [`Connection`](rollcall_runtime::Connection) subscriber.
//!
//! ## Routes
//!
//! | Route | Access | Effect |
//! |-------|--------|--------|
//! | `GET /ws?acara=<id\|all>` | public | subscribe to a partition |
//! | `POST /api/input-presensi` | public | store check-in, signal actor |
//! | `POST /api/input-undangan` | admin | store invitation, signal actor |
//! | `POST /api/input-acara` | admin | store event, signal `"all"` |
//! | `POST /api/admin/input-subgroup-group` | admin | upsert category/group |
//! | `GET /api/get-initial-data?acara=<id>` | public | event + fresh summary |
//! | `GET /api/admin/data-presensi?acara=<id>` | admin | roster |
//! | `GET /api/admin/data-undangan?acara=<id>` | admin | invitations |
//! | `GET /api/admin/get-all-subgroups` | admin | group dropdown data |
//! | `POST /api/auth/login` / `logout` | public | session cookie |
//! | `GET /api/auth/verify-session` | public | claims echo or 401 |

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::Config;
pub use error::AppError;
pub use routes::router;
pub use state::AppState;
