//! Infrastructure adapters: persistence, HTTP, storage, telemetry.

pub mod db;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod recaptcha;
pub mod telemetry;
pub mod uploads;
