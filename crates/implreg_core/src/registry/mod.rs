//! Deferred registration protocol.
//!
//! Contributors hand maps to a [`Registry`] whether or not a consumer exists
//! yet. Maps that arrive early are buffered and drained into the consumer's
//! [`MergeHandler`] when it installs itself; later maps dispatch directly.
//!
//! The [`global`] module wraps one registry per channel behind process-wide
//! entry points for hosts that cannot pass a registry around.

pub mod deferred;
pub mod global;
pub mod handler;

pub use deferred::{
    BufferPolicy, Delivery, InstallReport, Registry, RegistryState, RegistryStats,
    UnknownPolicyError,
};
pub use handler::MergeHandler;
