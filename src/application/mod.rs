//! Application layer: services, repository traits, and process-wide shared
//! state (cache, broadcast hub, mail queue).

pub mod cache;
pub mod content;
pub mod error;
pub mod mail;
pub mod reconcile;
pub mod repos;
pub mod stream;
