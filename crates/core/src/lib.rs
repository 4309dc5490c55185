//! Scoreday Core - page logic for a live sports-day scoreboard
//!
//! This crate contains the event bus, the domain types, the mountable page
//! components and the ports (interfaces) the application implements. It has
//! no dependencies on terminal UI, network transports or the filesystem -
//! those are handled by adapters in the `scoreday` crate.

pub mod bus;
pub mod components;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for ergonomics
pub use bus::*;
pub use domain::*;
pub use error::*;
