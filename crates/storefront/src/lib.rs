//! Meridian storefront client library.
//!
//! This crate is the data-synchronization layer between views (a CLI today,
//! anything that can hold a callback tomorrow) and the Meridian shop API.
//!
//! # Architecture
//!
//! - [`api`] - Typed HTTP client for the shop API (reqwest, cookie-scoped
//!   cart session)
//! - [`sync`] - The caching core: canonical cache keys, a versioned
//!   subscriber-notifying cache store, a deduplicating fetch coordinator,
//!   and an optimistic mutation coordinator
//! - [`catalog`] - Catalog query state (filters, sort, search, pagination)
//! - [`cart`] - Cart operations and optimistic prediction
//! - [`state`] - [`state::Storefront`], the process-scoped handle wiring it
//!   all together
//!
//! # Example
//!
//! ```rust,ignore
//! use meridian_storefront::catalog::CatalogQuery;
//! use meridian_storefront::config::ClientConfig;
//! use meridian_storefront::state::Storefront;
//!
//! let storefront = Storefront::new(ClientConfig::from_env()?)?;
//!
//! // Serve whatever is cached, refresh in the background.
//! let mut query = CatalogQuery::default();
//! query.set_search("mug");
//! let snapshot = storefront.products(&query);
//!
//! // Cart mutations apply locally first, then reconcile with the server.
//! let cart = storefront.set_quantity(item_id, 3).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod state;
pub mod sync;
