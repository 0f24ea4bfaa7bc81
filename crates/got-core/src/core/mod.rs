//! Internal implementation modules for `got-core`.
//!
//! Most callers should go through `got_core::api` rather than importing these
//! modules directly.

pub mod commands;
pub mod config;
pub mod errors;
pub(crate) mod fs;
pub mod runtime;
pub mod store;
pub mod sync;
pub mod tooling;
