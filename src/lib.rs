//! Scenario study guides for conversational Japanese, in the terminal.
//!
//! The binary in `main.rs` drives the TUI; everything it needs lives here so
//! integration tests can exercise the same flows headlessly.

pub mod app;
pub mod config;
pub mod event;
pub mod export;
pub mod generator;
pub mod http;
pub mod library;
pub mod logging;
pub mod quota;
pub mod session;
pub mod share;
pub mod store;
pub mod ui;
