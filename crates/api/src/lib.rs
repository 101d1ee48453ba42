//! StreamSource API server library.
//!
//! Exposes config, state, error handling, routes, WebSocket infrastructure,
//! and background jobs so integration tests and the binary entrypoint can
//! both build the same application.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
