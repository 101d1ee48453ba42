//! Caching, retrying proxy in front of the Notion streams database.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod routes;
pub mod state;
