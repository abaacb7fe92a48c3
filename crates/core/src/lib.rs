//! SwiftCart Core - Shared types library.
//!
//! This crate provides the types used across all SwiftCart components:
//! - `storefront` - Catalog client, cart store, and view orchestration
//! - `cli` - Headless driver for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart arithmetic - no I/O, no
//! persistence, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, products, category filters, and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
