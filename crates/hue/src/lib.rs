pub mod api;
pub mod colors;
pub mod combine;
pub mod command;
pub mod error;
pub mod event;
pub mod state;
pub mod store;
