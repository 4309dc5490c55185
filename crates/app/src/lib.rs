//! Scoreday application library
//!
//! Wires the page logic from `scoreday-core` to a score store, a local
//! scoring backend and a terminal UI.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod services;
pub mod tui;
