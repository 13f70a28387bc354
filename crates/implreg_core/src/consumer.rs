//! Consumer side of the registration protocol.
//!
//! # Responsibility
//! - Own the merged per-library index a documentation page renders from.
//! - Install itself as the registry handler and drain buffered maps.
//!
//! # Invariants
//! - Entries for a library keep contribution order across merges.
//! - Overlapping library keys append; nothing is deduplicated.

use crate::model::LibraryMap;
use crate::registry::{InstallReport, MergeHandler, Registry};
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Merged index of every map received through the protocol.
#[derive(Debug)]
pub struct LibraryIndex<E> {
    libraries: Mutex<BTreeMap<String, Vec<E>>>,
    merges: AtomicUsize,
}

impl<E> Default for LibraryIndex<E> {
    fn default() -> Self {
        Self {
            libraries: Mutex::new(BTreeMap::new()),
            merges: AtomicUsize::new(0),
        }
    }
}

impl<E> LibraryIndex<E>
where
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index and installs it as the registry handler.
    ///
    /// Buffered maps are merged before this returns.
    pub fn attach(registry: &mut Registry<E>) -> (Arc<Self>, InstallReport) {
        let index = Arc::new(Self::new());
        let handler: Arc<dyn MergeHandler<E>> = index.clone();
        let report = registry.install(handler);
        (index, report)
    }
}

impl<E> LibraryIndex<E> {
    fn guard(&self) -> MutexGuard<'_, BTreeMap<String, Vec<E>>> {
        self.libraries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sorted library names seen so far.
    pub fn libraries(&self) -> Vec<String> {
        self.guard().keys().cloned().collect()
    }

    /// Number of distinct libraries.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Total entries across libraries.
    pub fn entry_count(&self) -> usize {
        self.guard().values().map(Vec::len).sum()
    }

    /// Library name -> entry count.
    pub fn entry_counts(&self) -> BTreeMap<String, usize> {
        self.guard()
            .iter()
            .map(|(library, entries)| (library.clone(), entries.len()))
            .collect()
    }

    /// Number of maps merged so far.
    pub fn merge_count(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }
}

impl<E: Clone> LibraryIndex<E> {
    /// Entries for one library, in contribution order.
    pub fn entries(&self, library: &str) -> Option<Vec<E>> {
        self.guard().get(library).cloned()
    }

    /// Copy of the whole index as a map.
    pub fn snapshot(&self) -> LibraryMap<E> {
        self.guard()
            .iter()
            .map(|(library, entries)| (library.clone(), entries.clone()))
            .collect()
    }
}

impl<E: Send> MergeHandler<E> for LibraryIndex<E> {
    fn merge(&self, map: LibraryMap<E>) {
        let mut libraries = self.guard();
        let incoming = map.len();
        for (library, entries) in map {
            libraries.entry(library).or_default().extend(entries);
        }
        let merges = self.merges.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "event=index_merge module=consumer status=ok libraries={} total_libraries={} merges={}",
            incoming,
            libraries.len(),
            merges
        );
    }
}
