//! Wardgate library
//!
//! Exposes the gateway internals for integration testing; the binary wires
//! the same modules in `main.rs`.

pub mod api;
pub mod app_state;
pub mod http;
pub mod init_telemetry;
pub mod settings;

pub use app_state::AppState;
