//! Merge handler contract installed by consumers.

use crate::model::LibraryMap;

/// Receiver of contributed maps once a consumer is ready.
///
/// Implementations must not call back into the registry that invokes them.
pub trait MergeHandler<E>: Send + Sync {
    fn merge(&self, map: LibraryMap<E>);
}

impl<E, F> MergeHandler<E> for F
where
    F: Fn(LibraryMap<E>) + Send + Sync,
{
    fn merge(&self, map: LibraryMap<E>) {
        self(map)
    }
}
