//! Herdbook API Server module
//!
//! JSON HTTP API over the register.
//! Run with `herdbook-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
