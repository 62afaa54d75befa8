//! Application layer
//!
//! The traversal controllers that orchestrate navigation, extraction and
//! reconciliation for the two site pipelines, plus the emission sink port
//! they hand finished records to.

pub mod error;
pub mod sink;
pub mod storefront;
pub mod traversal;
