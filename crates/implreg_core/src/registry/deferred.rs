//! Deferred registration registry.
//!
//! # Responsibility
//! - Accept contributed maps before and after a consumer exists.
//! - Buffer early contributions and drain them when a handler is installed.
//!
//! # Invariants
//! - Either the pending buffer or the active handler is the destination,
//!   never both: once a handler is installed the buffer stays empty.
//! - Buffered maps are delivered exactly once, in arrival order.
//! - `SingleSlot` keeps only the latest pre-install map; the overwrite is
//!   logged and counted, never raised.

use crate::model::{Channel, LibraryMap};
use crate::registry::handler::MergeHandler;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// How contributions are held while no handler is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Keep every pre-install map and drain all of them in order.
    #[default]
    Queue,
    /// Keep only the most recent pre-install map.
    SingleSlot,
}

impl BufferPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::SingleSlot => "single_slot",
        }
    }
}

impl Display for BufferPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown buffer policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicyError(pub String);

impl Display for UnknownPolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported buffer policy `{}`; expected queue|single_slot",
            self.0
        )
    }
}

impl Error for UnknownPolicyError {}

impl FromStr for BufferPolicy {
    type Err = UnknownPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "single_slot" | "single-slot" | "slot" => Ok(Self::SingleSlot),
            other => Err(UnknownPolicyError(other.to_string())),
        }
    }
}

/// Observable protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    /// No handler and nothing buffered.
    Uninitialized,
    /// No handler, at least one map buffered.
    Buffering,
    /// Handler installed; contributions dispatch directly.
    Active,
}

/// Where one `register` call sent its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed synchronously to the active handler.
    Dispatched,
    /// Held until a handler is installed.
    Buffered,
    /// Held, and an earlier buffered map was discarded to make room.
    Replaced,
}

/// Outcome of one `install` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallReport {
    /// Buffered maps delivered to the new handler.
    pub drained: usize,
    /// Whether a previously installed handler was replaced.
    pub replaced_handler: bool,
}

/// Lifetime counters for one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Maps that went into the pending buffer.
    pub buffered: usize,
    /// Maps delivered directly to an installed handler.
    pub dispatched: usize,
    /// Buffered maps delivered at install time.
    pub drained: usize,
    /// Buffered maps lost to a single-slot overwrite.
    pub discarded: usize,
}

/// Registry mediating contributors and the consumer of one channel.
pub struct Registry<E> {
    channel: Channel,
    policy: BufferPolicy,
    pending: VecDeque<LibraryMap<E>>,
    handler: Option<Arc<dyn MergeHandler<E>>>,
    stats: RegistryStats,
}

impl<E> Registry<E> {
    /// Creates a registry with the default queue policy.
    pub fn new(channel: Channel) -> Self {
        Self::with_policy(channel, BufferPolicy::default())
    }

    pub fn with_policy(channel: Channel, policy: BufferPolicy) -> Self {
        Self {
            channel,
            policy,
            pending: VecDeque::new(),
            handler: None,
            stats: RegistryStats::default(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn policy(&self) -> BufferPolicy {
        self.policy
    }

    pub fn state(&self) -> RegistryState {
        if self.handler.is_some() {
            RegistryState::Active
        } else if self.pending.is_empty() {
            RegistryState::Uninitialized
        } else {
            RegistryState::Buffering
        }
    }

    pub fn is_active(&self) -> bool {
        self.handler.is_some()
    }

    /// Number of maps waiting for a handler.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffered maps in arrival order.
    pub fn pending(&self) -> impl Iterator<Item = &LibraryMap<E>> {
        self.pending.iter()
    }

    /// Maps lost to single-slot overwrites so far.
    pub fn discarded(&self) -> usize {
        self.stats.discarded
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Hands one contribution to the registry.
    ///
    /// Dispatches synchronously when a handler is installed; otherwise
    /// buffers according to the policy.
    pub fn register(&mut self, map: LibraryMap<E>) -> Delivery {
        if let Some(handler) = &self.handler {
            debug!(
                "event=fragment_dispatched module=registry status=ok channel={} libraries={}",
                self.channel,
                map.len()
            );
            handler.merge(map);
            self.stats.dispatched += 1;
            return Delivery::Dispatched;
        }

        self.stats.buffered += 1;
        match self.policy {
            BufferPolicy::Queue => {
                self.pending.push_back(map);
                debug!(
                    "event=fragment_buffered module=registry status=ok channel={} pending={}",
                    self.channel,
                    self.pending.len()
                );
                Delivery::Buffered
            }
            BufferPolicy::SingleSlot => {
                let previous = self.pending.pop_back();
                self.pending.clear();
                self.pending.push_back(map);
                match previous {
                    Some(lost) => {
                        self.stats.discarded += 1;
                        warn!(
                            "event=pending_overwritten module=registry status=discarded channel={} lost_libraries={} lost_entries={}",
                            self.channel,
                            lost.len(),
                            lost.entry_count()
                        );
                        Delivery::Replaced
                    }
                    None => {
                        debug!(
                            "event=fragment_buffered module=registry status=ok channel={} pending=1",
                            self.channel
                        );
                        Delivery::Buffered
                    }
                }
            }
        }
    }

    /// Installs the consumer's handler and drains pending maps into it.
    ///
    /// A second install replaces the handler but never re-delivers maps that
    /// were already drained.
    pub fn install(&mut self, handler: Arc<dyn MergeHandler<E>>) -> InstallReport {
        let replaced_handler = self.handler.replace(Arc::clone(&handler)).is_some();
        if replaced_handler {
            warn!(
                "event=handler_replaced module=registry status=ok channel={}",
                self.channel
            );
        }

        let mut drained = 0;
        while let Some(map) = self.pending.pop_front() {
            handler.merge(map);
            drained += 1;
        }
        self.stats.drained += drained;

        info!(
            "event=handler_installed module=registry status=ok channel={} drained={} policy={}",
            self.channel, drained, self.policy
        );
        InstallReport {
            drained,
            replaced_handler,
        }
    }

    /// Ends the registry lifecycle.
    ///
    /// Drops the handler and returns any maps that were never delivered. The
    /// registry is `Uninitialized` afterwards and keeps its policy.
    pub fn teardown(&mut self) -> Vec<LibraryMap<E>> {
        let had_handler = self.handler.take().is_some();
        let undelivered: Vec<_> = self.pending.drain(..).collect();
        self.stats = RegistryStats::default();
        info!(
            "event=registry_teardown module=registry status=ok channel={} had_handler={} undelivered={}",
            self.channel,
            had_handler,
            undelivered.len()
        );
        undelivered
    }
}

impl<E> Debug for Registry<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("channel", &self.channel)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish()
    }
}
