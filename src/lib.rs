pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod script;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
