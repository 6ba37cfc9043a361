//! # Taskboard Shared Library
//!
//! Domain types, the ordering core, storage backends and the component
//! services behind the taskboard HTTP API.
//!
//! ## Module Organization
//!
//! - `ids`: typed identifiers
//! - `models`: users, boards, columns and cards
//! - `ordering`: dense-rank range shifts
//! - `store`: the `BoardStore` seam with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations
//! - `auth`: passwords, JWTs, request identity and the board access gate
//! - `services`: accounts, boards, columns and cards
//! - `error`: store and service errors

pub mod auth;
pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod ordering;
pub mod services;
pub mod store;

/// Current version of the taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
