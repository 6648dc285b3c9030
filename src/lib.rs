//! Hazmo inventory sync library
//!
//! Client-side synchronization for the supplier / product inventory: a local
//! mirror of the hosted entity store, patched only from confirmed store
//! responses, plus the table view state built on top of it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod edit_session;
pub mod errors;
pub mod events;
pub mod mirror;
pub mod models;
pub mod notifications;
pub mod selection;
pub mod services;
pub mod store;
pub mod view;

pub use errors::{ServiceError, StoreError};
pub use services::InventorySyncService;
pub use store::{EntityStore, HttpStore, InMemoryStore};
pub use view::TableView;
