//! Core module - server configuration, state and errors
//!
//! # Structure
//!
//! - [`Config`] - server configuration (env-driven)
//! - [`ServerState`] - shared service handles
//! - [`Server`] - HTTP server lifecycle
//! - [`ServerError`] - server-level errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
