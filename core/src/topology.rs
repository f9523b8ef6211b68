//! # Topology Builder
//!
//! Runs once, inside `init`, and turns the live domain and device data into
//! the immutable shape the rest of the engine works against:
//!
//! ```text
//!   VoltageDomain ──supplies──▶ device name ──registry──▶ OppTable
//!        │                                                   │
//!        │ dependency tables                                 │ available points
//!        ▼                                                   ▼
//!   DomainNode { levels, tables, role }        DeviceNode { points (slots) }
//! ```
//!
//! A supplied device that never registered produces a node with no points.
//! Unavailable operating points are dropped here and never seen again.

extern crate alloc;
use alloc::vec::Vec;

use bitflags::bitflags;
use customvoltage_hal::{Hertz, MicroVolt};

use crate::domain::{DependencyEntry, VoltageDomain, VoltageLevel};
use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::opp::DeviceHandle;
use crate::registry::DeviceRegistry;

// =============================================================================
// RAW TABLE DECODING
// =============================================================================

/// Decode raw level data, stopping at the zero sentinel
pub fn level_table(raw: &[MicroVolt]) -> Vec<VoltageLevel> {
    raw.iter()
        .take_while(|v| !v.is_zero())
        .map(|&v| VoltageLevel::new(v))
        .collect()
}

/// Decode raw dependency data, stopping at the entry whose main voltage is zero
pub fn dependency_entries(raw: &[DependencyEntry]) -> Vec<DependencyEntry> {
    raw.iter()
        .take_while(|e| !e.main_volt.is_zero())
        .copied()
        .collect()
}

// =============================================================================
// NODES
// =============================================================================

/// Index of a domain inside a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub(crate) usize);

impl DomainId {
    /// Position in the context's domain list
    pub fn index(self) -> usize {
        self.0
    }
}

bitflags! {
    /// Role of a domain in the dependency topology
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DomainRole: u8 {
        /// Owns dependency tables on other domains
        const MAIN        = 1 << 0;
        /// Some other domain depends on it
        const SHARED      = 1 << 1;
        /// Its levels are labelled by a bound frequency-bearing device
        const FREQ_SCALED = 1 << 2;
    }
}

/// A dependency table resolved to domain ids
#[derive(Debug, Clone)]
pub struct TableNode {
    /// The depended-on domain
    pub dep: DomainId,
    /// Entries as recorded at init
    pub entries: Vec<DependencyEntry>,
}

/// A domain as seen at init
#[derive(Debug, Clone)]
pub struct DomainNode {
    /// Domain id
    pub id: DomainId,
    /// Domain name
    pub name: &'static str,
    /// Role flags
    pub role: DomainRole,
    /// Nominal voltages at init, ascending
    pub levels: Vec<MicroVolt>,
    /// Dependency tables, in declaration order
    pub tables: Vec<TableNode>,
}

/// An available operating point as seen at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundPoint {
    /// Position in the device's operating-point table
    pub slot: usize,
    /// Frequency
    pub rate: Hertz,
    /// Voltage at init
    pub u_volt: MicroVolt,
}

/// A device supplied by a domain
#[derive(Debug, Clone)]
pub struct DeviceNode {
    /// Device name
    pub name: &'static str,
    /// Supplying domain
    pub domain: DomainId,
    /// Registered handle, `None` if the device never registered
    pub handle: Option<DeviceHandle>,
    /// Available points in table order
    pub points: Vec<BoundPoint>,
}

/// The immutable topology
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Domains, indexed by [`DomainId`]
    pub domains: Vec<DomainNode>,
    /// Devices, grouped by supplying domain in declaration order
    pub devices: Vec<DeviceNode>,
}

impl Topology {
    /// Build the topology from the live domains and the bound devices
    pub fn build(domains: &[VoltageDomain], registry: &DeviceRegistry) -> VoltageResult<Self> {
        let mut topology = Topology::default();

        for (index, domain) in domains.iter().enumerate() {
            let id = DomainId(index);

            if domains[..index].iter().any(|d| d.name() == domain.name()) {
                return Err(VoltageError::from_kind(ErrorKind::DuplicateDomain)
                    .with_domain(domain.name()));
            }

            let state = domain.lock();
            if state.levels.is_empty() {
                return Err(VoltageError::from_kind(ErrorKind::EmptyTable)
                    .with_domain(domain.name()));
            }

            let mut tables = Vec::with_capacity(state.dep_tables.len());
            for table in &state.dep_tables {
                let dep = find_domain(domains, table.dep_domain).ok_or_else(|| {
                    VoltageError::from_kind(ErrorKind::UnknownDomain)
                        .with_details(alloc::format!("dependency on {}", table.dep_domain))
                        .with_domain(domain.name())
                })?;
                tables.push(TableNode {
                    dep,
                    entries: table.entries.clone(),
                });
            }

            let mut role = DomainRole::empty();
            if !tables.is_empty() {
                role |= DomainRole::MAIN;
            }
            if domain.freq_device().is_some_and(|name| registry.contains(name)) {
                role |= DomainRole::FREQ_SCALED;
            }

            topology.domains.push(DomainNode {
                id,
                name: domain.name(),
                role,
                levels: state.nominals(),
                tables,
            });
            drop(state);

            for &name in domain.supplied_devices() {
                let handle = registry.get(name).cloned();
                let points = handle.as_ref().map(available_points).unwrap_or_default();
                topology.devices.push(DeviceNode {
                    name,
                    domain: id,
                    handle,
                    points,
                });
            }
        }

        let shared: Vec<DomainId> = topology
            .domains
            .iter()
            .flat_map(|d| d.tables.iter().map(|t| t.dep))
            .collect();
        for id in shared {
            topology.domains[id.0].role |= DomainRole::SHARED;
        }

        Ok(topology)
    }

    /// Node of a domain
    pub fn domain(&self, id: DomainId) -> Option<&DomainNode> {
        self.domains.get(id.0)
    }

    /// Devices supplied by a domain
    pub fn devices_of(&self, id: DomainId) -> impl Iterator<Item = (usize, &DeviceNode)> + '_ {
        self.devices
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.domain == id)
    }

    /// Main domains holding a table on `shared`
    pub fn dependents_of(&self, shared: DomainId) -> impl Iterator<Item = DomainId> + '_ {
        self.domains
            .iter()
            .filter(move |d| d.tables.iter().any(|t| t.dep == shared))
            .map(|d| d.id)
    }
}

fn find_domain(domains: &[VoltageDomain], name: &str) -> Option<DomainId> {
    domains.iter().position(|d| d.name() == name).map(DomainId)
}

fn available_points(handle: &DeviceHandle) -> Vec<BoundPoint> {
    handle
        .snapshot()
        .into_iter()
        .enumerate()
        .filter(|(_, p)| p.available)
        .map(|(slot, p)| BoundPoint {
            slot,
            rate: p.rate,
            u_volt: p.u_volt,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opp::{OperatingPoint, OppTable};
    use crate::testing::NullRegulator;
    use alloc::sync::Arc;
    use alloc::vec;

    fn domains() -> Vec<VoltageDomain> {
        vec![
            VoltageDomain::new(
                "mpu",
                &[MicroVolt(1_025_000), MicroVolt(1_200_000)],
                Arc::new(NullRegulator),
            )
            .frequency_device("mpu")
            .depends_on("core", &[DependencyEntry::new(1_025_000, 962_000)]),
            VoltageDomain::new(
                "core",
                &[MicroVolt(962_000), MicroVolt(1_127_000)],
                Arc::new(NullRegulator),
            )
            .supplies(&["l3", "gpu"]),
        ]
    }

    #[test]
    fn test_level_table_sentinel() {
        let levels = level_table(&[MicroVolt(1), MicroVolt(2), MicroVolt::ZERO, MicroVolt(3)]);
        assert_eq!(levels.len(), 2);
        assert!(levels.iter().all(|l| !l.calibrated));
        assert!(level_table(&[]).is_empty());
    }

    #[test]
    fn test_build_roles_and_devices() {
        let domains = domains();
        let mut registry = DeviceRegistry::new(["mpu", "l3", "gpu"]);
        registry.register(
            "mpu",
            OppTable::shared(
                "mpu",
                vec![
                    OperatingPoint::new(Hertz::from_mhz(350), MicroVolt(1_025_000)),
                    OperatingPoint::unavailable(Hertz::from_mhz(600), MicroVolt(1_100_000)),
                    OperatingPoint::new(Hertz::from_mhz(700), MicroVolt(1_200_000)),
                ],
            ),
        );

        let topology = Topology::build(&domains, &registry).unwrap();

        let mpu = topology.domain(DomainId(0)).unwrap();
        let core = topology.domain(DomainId(1)).unwrap();
        assert_eq!(mpu.role, DomainRole::MAIN | DomainRole::FREQ_SCALED);
        assert_eq!(core.role, DomainRole::SHARED);
        assert_eq!(mpu.tables[0].dep, DomainId(1));

        let (_, mpu_dev) = topology.devices_of(DomainId(0)).next().unwrap();
        let slots: Vec<_> = mpu_dev.points.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![0, 2]);

        // l3 and gpu never registered
        assert!(topology.devices_of(DomainId(1)).all(|(_, d)| d.points.is_empty()));
        assert_eq!(topology.dependents_of(DomainId(1)).collect::<Vec<_>>(), vec![DomainId(0)]);
    }

    #[test]
    fn test_unknown_dependency_domain() {
        let domains = vec![VoltageDomain::new("iva", &[MicroVolt(962_000)], Arc::new(NullRegulator))
            .depends_on("core", &[DependencyEntry::new(962_000, 962_000)])];
        let err = Topology::build(&domains, &DeviceRegistry::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownDomain);
        assert_eq!(err.domain(), Some("iva"));
    }

    #[test]
    fn test_empty_table() {
        let domains = vec![VoltageDomain::new("mpu", &[MicroVolt::ZERO], Arc::new(NullRegulator))];
        let err = Topology::build(&domains, &DeviceRegistry::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyTable);
    }
}
