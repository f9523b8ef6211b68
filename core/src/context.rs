//! # Engine Context
//!
//! [`CustomVoltage`] owns every domain, the device registry and, once
//! initialized, the topology and the resolved indices. Nothing lives in
//! process-wide statics; callers hold the context and pass it around.
//!
//! ## Initialization Sequence
//!
//! ```text
//!   CustomVoltage::new(domains, config)
//!        │
//!        ├── register_freq_lock(outer)      shared with the frequency path
//!        ├── register_dvfs_lock(inner)      shared with the DVFS path
//!        ├── register_opp_device(name, h)   once per device, first wins
//!        │
//!        └── init()  ──▶ Topology::build ──▶ Resolution::resolve
//! ```
//!
//! Devices that have not registered when `init` runs are treated as absent
//! for the lifetime of the context.

extern crate alloc;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::config::EngineConfig;
use crate::dependency::{Diagnostic, Resolution};
use crate::domain::VoltageDomain;
use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::opp::DeviceHandle;
use crate::registry::{DeviceRegistry, Registration};
use crate::topology::{DomainId, DomainRole, Topology};

/// A serialization lock shared with an external critical section
pub type SerializationLock = Arc<Mutex<()>>;

/// State fixed by `init`
#[derive(Debug)]
pub(crate) struct Bound {
    pub(crate) topology: Topology,
    pub(crate) resolution: Resolution,
    pub(crate) freq_lock: SerializationLock,
    pub(crate) dvfs_lock: SerializationLock,
}

/// The voltage override engine
#[derive(Debug)]
pub struct CustomVoltage {
    config: EngineConfig,
    domains: Vec<VoltageDomain>,
    registry: DeviceRegistry,
    freq_lock: Option<SerializationLock>,
    dvfs_lock: Option<SerializationLock>,
    bound: Option<Bound>,
}

impl CustomVoltage {
    /// Create an engine over `domains`
    pub fn new(domains: Vec<VoltageDomain>, config: EngineConfig) -> Self {
        let known: Vec<&'static str> = domains
            .iter()
            .flat_map(|d| d.supplied_devices().iter().copied())
            .collect();

        Self {
            config,
            registry: DeviceRegistry::new(known),
            domains,
            freq_lock: None,
            dvfs_lock: None,
            bound: None,
        }
    }

    /// Register the outer lock, taken by the frequency-scaling path
    pub fn register_freq_lock(&mut self, lock: SerializationLock) {
        self.freq_lock = Some(lock);
    }

    /// Register the inner lock, taken by the voltage-scaling path
    pub fn register_dvfs_lock(&mut self, lock: SerializationLock) {
        self.dvfs_lock = Some(lock);
    }

    /// Register a device by name
    pub fn register_opp_device(&mut self, name: &'static str, handle: DeviceHandle) -> Registration {
        self.registry.register(name, handle)
    }

    /// Build the topology and resolve every index; runs once
    pub fn init(&mut self) -> VoltageResult<()> {
        if self.bound.is_some() {
            return Err(VoltageError::from_kind(ErrorKind::AlreadyInitialized));
        }

        let freq_lock = self.freq_lock.clone().ok_or_else(|| {
            VoltageError::new(ErrorKind::MissingLock, "Frequency lock not registered")
        })?;
        let dvfs_lock = self.dvfs_lock.clone().ok_or_else(|| {
            VoltageError::new(ErrorKind::MissingLock, "DVFS lock not registered")
        })?;

        let topology = Topology::build(&self.domains, &self.registry)?;
        let resolution = Resolution::resolve(&topology, self.config.unmatched)?;

        for node in &topology.domains {
            let bound_points: usize = topology.devices_of(node.id).map(|(_, d)| d.points.len()).sum();
            log::info!(
                "customvoltage: {} {} levels, {} operating points, {} dependency tables, role {:?}",
                node.name,
                node.levels.len(),
                bound_points,
                node.tables.len(),
                node.role
            );
        }
        let stats = self.registry.stats();
        log::info!(
            "customvoltage: {} devices bound, {} registrations ignored",
            stats.bound,
            stats.ignored
        );
        if !resolution.is_clean() {
            log::warn!(
                "customvoltage: {} resolver diagnostics, see resolver report",
                resolution.diagnostics.len()
            );
        }

        self.registry.lock();
        self.bound = Some(Bound {
            topology,
            resolution,
            freq_lock,
            dvfs_lock,
        });

        Ok(())
    }

    /// Check if `init` succeeded
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Id of the domain called `name`
    pub fn domain_id(&self, name: &str) -> Option<DomainId> {
        self.domains
            .iter()
            .position(|d| d.name() == name)
            .map(DomainId)
    }

    /// Domain by id
    pub fn domain(&self, id: DomainId) -> VoltageResult<&VoltageDomain> {
        self.domains
            .get(id.0)
            .ok_or_else(|| VoltageError::from_kind(ErrorKind::UnknownDomain))
    }

    /// All domains in declaration order
    pub fn domains(&self) -> &[VoltageDomain] {
        &self.domains
    }

    /// Device registry
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Topology built by `init`
    pub fn topology(&self) -> VoltageResult<&Topology> {
        self.bound().map(|b| &b.topology)
    }

    /// Indices resolved by `init`
    pub fn resolution(&self) -> VoltageResult<&Resolution> {
        self.bound().map(|b| &b.resolution)
    }

    /// Fallbacks and ambiguities recorded by the resolver
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.bound
            .as_ref()
            .map(|b| b.resolution.diagnostics.as_slice())
            .unwrap_or(&[])
    }

    /// Role of a domain
    pub fn role(&self, id: DomainId) -> VoltageResult<DomainRole> {
        self.topology()?
            .domain(id)
            .map(|node| node.role)
            .ok_or_else(|| VoltageError::from_kind(ErrorKind::UnknownDomain))
    }

    pub(crate) fn bound(&self) -> VoltageResult<&Bound> {
        self.bound
            .as_ref()
            .ok_or_else(|| VoltageError::from_kind(ErrorKind::NotInitialized))
    }
}
