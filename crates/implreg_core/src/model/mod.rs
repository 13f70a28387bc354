//! Payload model shared by contributors, registries and consumers.
//!
//! # Responsibility
//! - Define the library-keyed maps handed through the registration protocol.
//! - Name the documentation channels that carry those maps.
//!
//! # Invariants
//! - Library names are unique keys within one map.
//! - Entry order inside a library is contribution order and is never changed.
//! - Entry payloads are opaque to core and keep their received wire shape.

pub mod implementor;
pub mod library_map;

pub use implementor::{Implementor, ImplementorShapeError};
pub use library_map::{Channel, ImplementorMap, LibraryMap, TypeImpl, TypeImplMap};
