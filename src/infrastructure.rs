//! Infrastructure layer
//!
//! The navigation-driver contract and its HTTP fallback implementation,
//! snapshot extractors for both site profiles, file sinks, configuration
//! and logging plumbing.

pub mod config;
pub mod driver;
pub mod extract;
pub mod http_driver;
pub mod logging;
pub mod sink;
