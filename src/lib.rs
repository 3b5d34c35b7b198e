pub mod bridge;
pub mod coalesce;
pub mod config;
pub mod controls;
pub mod error;
pub mod session;
