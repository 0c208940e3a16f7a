// Core Gemini API functionality for the Maira backend:
// - API client for content generation and the Files API
// - Request/response data structures
// - Model resolution with single-success caching
// - Configuration loading
// - Shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

// Export resolver module - Model selection with fallback
pub mod resolver;
pub use resolver::{ListModels, ModelResolver, GENERATE_CONTENT_METHOD};
