pub mod api;
pub mod config;
pub mod notifications;
pub mod telemetry;
