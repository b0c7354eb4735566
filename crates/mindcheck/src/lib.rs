pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod journal;
pub mod live;
pub mod screening;
pub mod telemetry;
