//! Backend for the Alexandria Petroleum Company website: content CRUD over a
//! handful of tables, a TTL snapshot cache for composite reads, and an SSE
//! change-event stream so admin edits propagate to open browser tabs.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
