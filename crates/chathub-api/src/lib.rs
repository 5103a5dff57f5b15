//! # chathub-api
//!
//! HTTP layer for ChatHub built on Axum.
//!
//! Provides the authenticated WebSocket upgrade, health endpoints, CORS and
//! request tracing middleware, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{run_server, serve};
pub use router::build_router;
pub use state::AppState;
