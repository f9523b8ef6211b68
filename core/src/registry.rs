//! # Device Registry
//!
//! Devices announce themselves by name before the engine is initialized.
//! Only names some domain supplies are accepted, and the first registration
//! of a name wins; the platform code that registers devices may run more
//! than once for the same block.

extern crate alloc;
use alloc::collections::{BTreeMap, BTreeSet};

use crate::opp::DeviceHandle;

/// Result of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The handle is now bound to the name
    Bound,
    /// The name was already bound; the new handle was dropped
    AlreadyBound,
    /// No domain supplies a device of that name
    UnknownName,
    /// The topology is already built
    Locked,
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Names bound
    pub bound: usize,
    /// Registrations dropped for any reason
    pub ignored: usize,
}

/// Name → device handle, first registration wins
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    known: BTreeSet<&'static str>,
    by_name: BTreeMap<&'static str, DeviceHandle>,
    locked: bool,
    stats: RegistryStats,
}

impl DeviceRegistry {
    /// Create a registry accepting the given names
    pub fn new(known: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            known: known.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Bind `handle` to `name` unless already bound
    pub fn register(&mut self, name: &'static str, handle: DeviceHandle) -> Registration {
        let outcome = if self.locked {
            Registration::Locked
        } else if !self.known.contains(name) {
            Registration::UnknownName
        } else if self.by_name.contains_key(name) {
            Registration::AlreadyBound
        } else {
            self.by_name.insert(name, handle);
            Registration::Bound
        };

        if outcome == Registration::Bound {
            self.stats.bound += 1;
        } else {
            self.stats.ignored += 1;
            log::debug!("customvoltage: ignoring device {} ({:?})", name, outcome);
        }

        outcome
    }

    /// Handle bound to `name`
    pub fn get(&self, name: &str) -> Option<&DeviceHandle> {
        self.by_name.get(name)
    }

    /// Check if `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Refuse further registrations
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Check if locked
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Get statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}
