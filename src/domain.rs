//! Domain layer
//!
//! Data model for extracted menu records, canonical product identity, the
//! reconciliation/assembly store and run-scoped session state. Nothing in
//! here touches the network or a browser.

pub mod assembly;
pub mod model;
pub mod session;
