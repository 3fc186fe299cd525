//! HTTP boundary for the prediction service.

pub mod server;

pub use server::{start_server, AppState};
