// Social Feed - follow graph, likes, notifications and feeds over SQLite

// Core types and primitives
pub mod core;

// Infrastructure - store, ID generation, auth tokens, request plumbing
pub mod infrastructure;

// Row and request types
pub mod models;

// Capability predicates used by the interaction handlers
pub mod privacy;

// User directory, notification log, post store, like ledger, feed, interactions
pub mod services;

// HTTP surface
pub mod app_state;
pub mod social_interface;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
