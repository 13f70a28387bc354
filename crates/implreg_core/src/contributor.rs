//! Contributor contract.
//!
//! # Responsibility
//! - Turn one loaded fragment into exactly one registration.
//!
//! # Invariants
//! - `contribute` consumes the contributor, so a map is registered at most
//!   once; it is registered unconditionally and synchronously.
//! - Contributors never fail: the returned [`Delivery`] is informational.

use crate::model::LibraryMap;
use crate::registry::{Delivery, Registry};
use log::debug;

/// One unit that supplies a single map to a registry.
pub trait Contributor<E>: Sized {
    /// Human-readable origin, e.g. a fragment path.
    fn source(&self) -> &str;

    /// Builds the contributed map.
    fn into_map(self) -> LibraryMap<E>;

    /// Registers the map with `registry`.
    fn contribute(self, registry: &mut Registry<E>) -> Delivery {
        let source = self.source().to_string();
        let delivery = registry.register(self.into_map());
        debug!(
            "event=contribution module=contributor status=ok channel={} source={} delivery={:?}",
            registry.channel(),
            source,
            delivery
        );
        delivery
    }
}

/// Contributor wrapping an already-built map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticContributor<E> {
    source: String,
    map: LibraryMap<E>,
}

impl<E> StaticContributor<E> {
    pub fn new(source: impl Into<String>, map: LibraryMap<E>) -> Self {
        Self {
            source: source.into(),
            map,
        }
    }
}

impl<E> Contributor<E> for StaticContributor<E> {
    fn source(&self) -> &str {
        &self.source
    }

    fn into_map(self) -> LibraryMap<E> {
        self.map
    }
}
