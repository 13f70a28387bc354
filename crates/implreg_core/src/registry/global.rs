//! Process-wide registration entry points.
//!
//! # Responsibility
//! - Expose `register_*` functions for fragments loaded without a handle.
//! - Let the consumer install its handler and drain whatever arrived first.
//!
//! # Invariants
//! - One registry per channel per process, created lazily.
//! - Handlers run while the channel lock is held; a handler that registers
//!   into the same channel deadlocks.

use crate::model::{Channel, Implementor, ImplementorMap, TypeImpl, TypeImplMap};
use crate::registry::deferred::{Delivery, InstallReport, Registry, RegistryState};
use crate::registry::handler::MergeHandler;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static IMPLEMENTORS: Lazy<Mutex<Registry<Implementor>>> =
    Lazy::new(|| Mutex::new(Registry::new(Channel::Implementors)));
static TYPE_IMPLS: Lazy<Mutex<Registry<TypeImpl>>> =
    Lazy::new(|| Mutex::new(Registry::new(Channel::TypeImpls)));

// Registry operations leave consistent state even if a handler panicked.
fn lock<E>(registry: &Mutex<Registry<E>>) -> MutexGuard<'_, Registry<E>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Global entry point called by implementor fragments.
pub fn register_implementors(map: ImplementorMap) -> Delivery {
    lock(&IMPLEMENTORS).register(map)
}

/// Global entry point called by type-impl fragments.
pub fn register_type_impls(map: TypeImplMap) -> Delivery {
    lock(&TYPE_IMPLS).register(map)
}

/// Installs the implementor consumer and drains pending implementor maps.
pub fn install_implementors_handler(
    handler: Arc<dyn MergeHandler<Implementor>>,
) -> InstallReport {
    lock(&IMPLEMENTORS).install(handler)
}

/// Installs the type-impl consumer and drains pending type-impl maps.
pub fn install_type_impls_handler(handler: Arc<dyn MergeHandler<TypeImpl>>) -> InstallReport {
    lock(&TYPE_IMPLS).install(handler)
}

/// Returns the protocol state of one global channel.
pub fn global_state(channel: Channel) -> RegistryState {
    match channel {
        Channel::Implementors => lock(&IMPLEMENTORS).state(),
        Channel::TypeImpls => lock(&TYPE_IMPLS).state(),
    }
}

/// Tears down both global registries, returning undelivered map counts.
pub fn reset_global_registries() -> (usize, usize) {
    let implementors = lock(&IMPLEMENTORS).teardown().len();
    let type_impls = lock(&TYPE_IMPLS).teardown().len();
    (implementors, type_impls)
}
