//! Stockroom Library
//!
//! This crate provides the core functionality for the Stockroom inventory
//! tool: typed models, the inventory store with its write-through rules,
//! JSON-file persistence, report derivations, and CSV export. The `stockroom`
//! binary is a thin CLI over this library.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod export;
pub mod models;
pub mod reports;
pub mod storage;
pub mod store;

pub use errors::ServiceError;
pub use store::InventoryStore;
