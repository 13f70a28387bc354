//! Page load replay.
//!
//! A page load runs fragment scripts and the consumer in an order the host
//! does not control. `PageSession` owns one registry per channel and lets the
//! caller decide when the consumers attach.

use crate::consumer::LibraryIndex;
use crate::contributor::{Contributor, StaticContributor};
use crate::fragment::Fragment;
use crate::loader::scan::load_fragment;
use crate::model::{Channel, Implementor, TypeImpl};
use crate::registry::{BufferPolicy, Delivery, InstallReport, Registry, RegistryState, RegistryStats};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Ordering choices for one replayed page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadPlan {
    pub policy: BufferPolicy,
    /// Fragments that load before the consumers; `None` means all of them.
    pub consumer_after: Option<usize>,
    /// Load fragments in reverse scan order.
    pub reverse: bool,
}

/// Fragment that did not contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Per-channel outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub state: RegistryState,
    pub stats: RegistryStats,
    /// Library name -> merged entry count.
    pub libraries: BTreeMap<String, usize>,
    pub pending: usize,
}

/// Summary of one replayed page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub policy: BufferPolicy,
    pub fragments_loaded: usize,
    pub failures: Vec<FragmentFailure>,
    pub implementors: ChannelReport,
    pub type_impls: ChannelReport,
}

/// One page's registries and consumers.
#[derive(Debug)]
pub struct PageSession {
    policy: BufferPolicy,
    implementors: Registry<Implementor>,
    type_impls: Registry<TypeImpl>,
    implementor_index: Option<Arc<LibraryIndex<Implementor>>>,
    type_impl_index: Option<Arc<LibraryIndex<TypeImpl>>>,
    fragments_loaded: usize,
    failures: Vec<FragmentFailure>,
}

impl PageSession {
    pub fn new(policy: BufferPolicy) -> Self {
        Self {
            policy,
            implementors: Registry::with_policy(Channel::Implementors, policy),
            type_impls: Registry::with_policy(Channel::TypeImpls, policy),
            implementor_index: None,
            type_impl_index: None,
            fragments_loaded: 0,
            failures: Vec::new(),
        }
    }

    /// Registers one fragment with the registry of its channel.
    pub fn contribute(&mut self, source: &str, fragment: Fragment) -> Delivery {
        self.fragments_loaded += 1;
        match fragment {
            Fragment::Implementors(map) => {
                StaticContributor::new(source, map).contribute(&mut self.implementors)
            }
            Fragment::TypeImpls(map) => {
                StaticContributor::new(source, map).contribute(&mut self.type_impls)
            }
        }
    }

    /// Records a fragment that could not be loaded.
    pub fn record_failure(&mut self, path: PathBuf, error: String) {
        warn!(
            "event=fragment_failed module=loader status=error path={} error={}",
            path.display(),
            error
        );
        self.failures.push(FragmentFailure { path, error });
    }

    /// Attaches both consumers; later calls are no-ops.
    pub fn attach_consumers(&mut self) -> Option<(InstallReport, InstallReport)> {
        if self.implementor_index.is_some() {
            return None;
        }
        let (implementors, implementors_report) = LibraryIndex::attach(&mut self.implementors);
        let (type_impls, type_impls_report) = LibraryIndex::attach(&mut self.type_impls);
        self.implementor_index = Some(implementors);
        self.type_impl_index = Some(type_impls);
        Some((implementors_report, type_impls_report))
    }

    pub fn implementor_index(&self) -> Option<&Arc<LibraryIndex<Implementor>>> {
        self.implementor_index.as_ref()
    }

    pub fn type_impl_index(&self) -> Option<&Arc<LibraryIndex<TypeImpl>>> {
        self.type_impl_index.as_ref()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            policy: self.policy,
            fragments_loaded: self.fragments_loaded,
            failures: self.failures.clone(),
            implementors: channel_report(&self.implementors, self.implementor_index.as_deref()),
            type_impls: channel_report(&self.type_impls, self.type_impl_index.as_deref()),
        }
    }
}

fn channel_report<E>(registry: &Registry<E>, index: Option<&LibraryIndex<E>>) -> ChannelReport {
    let libraries = index.map(LibraryIndex::entry_counts).unwrap_or_default();
    ChannelReport {
        state: registry.state(),
        stats: registry.stats(),
        libraries,
        pending: registry.pending_len(),
    }
}

/// Replays a page load over `paths` following `plan`.
pub fn run_session(paths: &[PathBuf], plan: &LoadPlan) -> SessionReport {
    let mut ordered: Vec<&PathBuf> = paths.iter().collect();
    if plan.reverse {
        ordered.reverse();
    }
    let attach_at = plan.consumer_after.unwrap_or(ordered.len()).min(ordered.len());

    let mut session = PageSession::new(plan.policy);
    for (position, path) in ordered.into_iter().enumerate() {
        if position == attach_at {
            session.attach_consumers();
        }
        match load_fragment(path) {
            Ok(loaded) => {
                session.contribute(&loaded.path.display().to_string(), loaded.fragment);
            }
            Err(err) => session.record_failure(path.clone(), err.to_string()),
        }
    }
    session.attach_consumers();

    let report = session.report();
    info!(
        "event=session_complete module=loader status=ok policy={} fragments={} failures={} discarded={}",
        plan.policy,
        report.fragments_loaded,
        report.failures.len(),
        report.implementors.stats.discarded + report.type_impls.stats.discarded
    );
    report
}
