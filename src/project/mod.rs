//! Project layer: the shared collection of parsed modules.
//!
//! Queries borrow a [`ParseCache`] read-only. Hosts that serve concurrent
//! requests keep it behind a [`SharedParseCache`] and hand each query a read
//! guard.

mod parse_cache;

use std::sync::Arc;

use parking_lot::RwLock;

pub use parse_cache::{Package, ParseCache};

/// A parse cache shared between concurrent queries.
pub type SharedParseCache = Arc<RwLock<ParseCache>>;

pub fn shared(cache: ParseCache) -> SharedParseCache {
    Arc::new(RwLock::new(cache))
}
