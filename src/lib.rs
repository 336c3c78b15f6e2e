//! Maintenance Management API Library
//!
//! Machines, maintenance tickets, spare parts, teams and user accounts,
//! exposed over HTTP/JSON and persisted in a key-value store. Each record
//! lives under `{prefix}:{key}`; a per-kind set enumerates the live keys.

pub mod api;
pub mod domain;
pub mod infrastructure;
