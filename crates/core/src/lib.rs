//! Meridian Core - Shared wire types.
//!
//! This crate provides the types shared by the Meridian components:
//! - `storefront` - Storefront API client and data-sync layer
//! - `cli` - Command-line storefront front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Every type
//! mirrors the JSON the Meridian shop API sends and receives, so the client
//! crates deserialize straight into them.
//!
//! # Modules
//!
//! - [`types`] - Catalog, cart, and pagination DTOs plus price formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
