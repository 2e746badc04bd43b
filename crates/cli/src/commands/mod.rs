//! CLI command implementations.

pub mod cart;
pub mod catalog;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use meridian_storefront::error::ClientError;

/// A fetch error surfaced from a cache entry.
///
/// Entries hold their error behind an `Arc` so every subscriber can see it;
/// the CLI unwraps that into something `?` can carry.
#[derive(Debug)]
pub struct FetchFailed(pub Arc<ClientError>);

impl fmt::Display for FetchFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for FetchFailed {}
