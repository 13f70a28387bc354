//! Deferred registration of documentation implementor fragments.
//!
//! Fragment scripts contribute library-keyed maps to a registry that may not
//! have a consumer yet. The registry buffers early contributions and drains
//! them when the consumer installs its handler.

pub mod consumer;
pub mod contributor;
pub mod fragment;
pub mod loader;
pub mod logging;
pub mod model;
pub mod registry;
pub mod settings;

pub use consumer::LibraryIndex;
pub use contributor::{Contributor, StaticContributor};
pub use fragment::{Fragment, FragmentError, FragmentResult};
pub use loader::{
    load_fragment, run_session, scan_doc_root, LoadPlan, LoaderError, LoaderResult, PageSession,
    SessionReport,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{Channel, Implementor, ImplementorMap, LibraryMap, TypeImpl, TypeImplMap};
pub use registry::{
    BufferPolicy, Delivery, InstallReport, MergeHandler, Registry, RegistryState, RegistryStats,
};
pub use settings::{load_settings, RegistrySettings, SettingsError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
