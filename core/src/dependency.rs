//! # Dependency Resolver
//!
//! Links every value that mirrors a voltage level to the index of that
//! level, once, at init:
//!
//! - each bound operating point gets the index of the level in its supplying
//!   domain whose nominal equals the point's voltage (its DependIndex);
//! - each dependency entry gets the index of the main-domain level matching
//!   its `main_volt` and the index of the shared-domain level matching its
//!   `dep_volt` (its cross-domain index).
//!
//! Matching is exact and the first equal level in table order wins. From
//! then on the engine updates by index and never compares voltages again.
//!
//! A value matching no level is handled per [`UnmatchedPolicy`]. A table with
//! repeated nominals makes any match on that value ambiguous; the first
//! level is used and the repetition is reported.

use core::fmt;

extern crate alloc;
use alloc::vec::Vec;

use customvoltage_hal::{Hertz, MicroVolt};

use crate::config::UnmatchedPolicy;
use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::topology::{DomainId, DomainNode, Topology};

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// What a resolved voltage belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// An operating point of a device
    OperatingPoint {
        /// Device name
        device: &'static str,
        /// Frequency of the point
        rate: Hertz,
    },
    /// The main-domain side of a dependency entry
    MainRequirement {
        /// Shared domain the table refers to
        dep: &'static str,
        /// Entry position
        entry: usize,
    },
    /// The shared-domain side of a dependency entry
    SharedRequirement {
        /// Main domain owning the table
        main: &'static str,
        /// Entry position
        entry: usize,
    },
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::OperatingPoint { device, rate } => write!(f, "{} opp {}", device, rate),
            Subject::MainRequirement { dep, entry } => write!(f, "{} table entry {}", dep, entry),
            Subject::SharedRequirement { main, entry } => {
                write!(f, "{} table entry {} requirement", main, entry)
            },
        }
    }
}

/// Finding of the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// No level matched; bound to level 0
    Unmatched {
        /// Domain searched
        domain: &'static str,
        /// Value owner
        subject: Subject,
        /// Value searched for
        volt: MicroVolt,
    },
    /// A nominal appears more than once in a table
    AmbiguousLevel {
        /// Domain owning the table
        domain: &'static str,
        /// Repeated nominal
        volt: MicroVolt,
        /// Level every match resolves to
        first: usize,
        /// Level no match can reach
        shadowed: usize,
    },
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Fixed indices of one dependency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossDomainIndex {
    /// Domain owning the table
    pub main: DomainId,
    /// Table position in the main domain
    pub table: usize,
    /// Entry position in the table
    pub entry: usize,
    /// Depended-on domain
    pub dep: DomainId,
    /// Main-domain level of the entry
    pub main_level: usize,
    /// Shared-domain level of the requirement
    pub dep_level: usize,
}

/// Output of the resolver
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// DependIndex per device node, parallel to its points
    pub point_levels: Vec<Vec<usize>>,
    /// One record per dependency entry
    pub cross: Vec<CrossDomainIndex>,
    /// Fallbacks and ambiguities encountered
    pub diagnostics: Vec<Diagnostic>,
}

/// Index of the first level equal to `volt`
pub fn match_level(levels: &[MicroVolt], volt: MicroVolt) -> Option<usize> {
    levels.iter().position(|&v| v == volt)
}

impl Resolution {
    /// Resolve every index of `topology`
    pub fn resolve(topology: &Topology, policy: UnmatchedPolicy) -> VoltageResult<Self> {
        let mut resolver = Resolver {
            policy,
            diagnostics: Vec::new(),
        };

        for node in &topology.domains {
            resolver.check_ambiguity(node);
        }

        let mut point_levels = Vec::with_capacity(topology.devices.len());
        for device in &topology.devices {
            let node = domain_node(topology, device.domain)?;
            let mut levels = Vec::with_capacity(device.points.len());
            for point in &device.points {
                let subject = Subject::OperatingPoint {
                    device: device.name,
                    rate: point.rate,
                };
                levels.push(resolver.lookup(node, point.u_volt, subject)?);
            }
            point_levels.push(levels);
        }

        let mut cross = Vec::new();
        for main in &topology.domains {
            for (table_index, table) in main.tables.iter().enumerate() {
                let dep = domain_node(topology, table.dep)?;
                for (entry_index, entry) in table.entries.iter().enumerate() {
                    let main_level = resolver.lookup(
                        main,
                        entry.main_volt,
                        Subject::MainRequirement {
                            dep: dep.name,
                            entry: entry_index,
                        },
                    )?;
                    let dep_level = resolver.lookup(
                        dep,
                        entry.dep_volt,
                        Subject::SharedRequirement {
                            main: main.name,
                            entry: entry_index,
                        },
                    )?;
                    cross.push(CrossDomainIndex {
                        main: main.id,
                        table: table_index,
                        entry: entry_index,
                        dep: table.dep,
                        main_level,
                        dep_level,
                    });
                }
            }
        }

        Ok(Self {
            point_levels,
            cross,
            diagnostics: resolver.diagnostics,
        })
    }

    /// DependIndex of a device node's point
    pub fn level_of(&self, device: usize, point: usize) -> Option<usize> {
        self.point_levels.get(device)?.get(point).copied()
    }

    /// True when no fallback or ambiguity was recorded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn domain_node(topology: &Topology, id: DomainId) -> VoltageResult<&DomainNode> {
    topology
        .domain(id)
        .ok_or_else(|| VoltageError::from_kind(ErrorKind::UnknownDomain))
}

struct Resolver {
    policy: UnmatchedPolicy,
    diagnostics: Vec<Diagnostic>,
}

impl Resolver {
    fn lookup(&mut self, node: &DomainNode, volt: MicroVolt, subject: Subject) -> VoltageResult<usize> {
        if let Some(level) = match_level(&node.levels, volt) {
            return Ok(level);
        }

        match self.policy {
            UnmatchedPolicy::DegradeToLowest => {
                log::warn!(
                    "customvoltage: {} at {} matches no {} level, using level 0",
                    subject,
                    volt,
                    node.name
                );
                self.diagnostics.push(Diagnostic::Unmatched {
                    domain: node.name,
                    subject,
                    volt,
                });
                Ok(0)
            },
            UnmatchedPolicy::Reject => Err(VoltageError::from_kind(ErrorKind::UnmatchedVoltage)
                .with_details(alloc::format!("{} at {}", subject, volt))
                .with_domain(node.name)),
        }
    }

    fn check_ambiguity(&mut self, node: &DomainNode) {
        for (shadowed, &volt) in node.levels.iter().enumerate() {
            let first = match match_level(&node.levels, volt) {
                Some(first) if first < shadowed => first,
                _ => continue,
            };
            log::warn!(
                "customvoltage: {} levels {} and {} share {}, matches resolve to {}",
                node.name,
                first,
                shadowed,
                volt,
                first
            );
            self.diagnostics.push(Diagnostic::AmbiguousLevel {
                domain: node.name,
                volt,
                first,
                shadowed,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyEntry, VoltageDomain};
    use crate::opp::{OperatingPoint, OppTable};
    use crate::registry::DeviceRegistry;
    use crate::testing::NullRegulator;
    use alloc::sync::Arc;
    use alloc::vec;

    fn topology(mpu_levels: &[MicroVolt], gpu_volt: MicroVolt) -> Topology {
        let domains = vec![
            VoltageDomain::new("mpu", mpu_levels, Arc::new(NullRegulator))
                .frequency_device("mpu")
                .depends_on(
                    "core",
                    &[
                        DependencyEntry::new(1_025_000, 962_000),
                        DependencyEntry::new(1_200_000, 1_127_000),
                        DependencyEntry::new(1_313_000, 1_127_000),
                    ],
                ),
            VoltageDomain::new(
                "core",
                &[MicroVolt(962_000), MicroVolt(1_127_000)],
                Arc::new(NullRegulator),
            )
            .supplies(&["gpu"]),
        ];

        let mut registry = DeviceRegistry::new(["mpu", "gpu"]);
        registry.register(
            "mpu",
            OppTable::shared(
                "mpu",
                vec![
                    OperatingPoint::new(Hertz::from_mhz(350), MicroVolt(1_025_000)),
                    OperatingPoint::new(Hertz::from_mhz(700), MicroVolt(1_200_000)),
                    OperatingPoint::new(Hertz::from_mhz(920), MicroVolt(1_313_000)),
                ],
            ),
        );
        registry.register(
            "gpu",
            OppTable::shared(
                "gpu",
                vec![
                    OperatingPoint::new(Hertz::from_mhz(153), MicroVolt(962_000)),
                    OperatingPoint::new(Hertz::from_mhz(307), gpu_volt),
                ],
            ),
        );

        Topology::build(&domains, &registry).unwrap()
    }

    const MPU: [MicroVolt; 3] = [MicroVolt(1_025_000), MicroVolt(1_200_000), MicroVolt(1_313_000)];

    #[test]
    fn test_point_levels() {
        let topology = topology(&MPU, MicroVolt(1_127_000));
        let resolution = Resolution::resolve(&topology, UnmatchedPolicy::Reject).unwrap();

        assert_eq!(resolution.point_levels, vec![vec![0, 1, 2], vec![0, 1]]);
        assert_eq!(resolution.level_of(1, 1), Some(1));
        assert!(resolution.is_clean());
    }

    #[test]
    fn test_cross_domain_indices() {
        let topology = topology(&MPU, MicroVolt(1_127_000));
        let resolution = Resolution::resolve(&topology, UnmatchedPolicy::Reject).unwrap();

        let pairs: Vec<_> = resolution
            .cross
            .iter()
            .map(|c| (c.entry, c.main_level, c.dep_level))
            .collect();
        assert_eq!(pairs, vec![(0, 0, 0), (1, 1, 1), (2, 2, 1)]);
        assert!(resolution.cross.iter().all(|c| c.main == DomainId(0) && c.dep == DomainId(1)));
    }

    #[test]
    fn test_unmatched_degrades_to_lowest() {
        let topology = topology(&MPU, MicroVolt(1_100_000));
        let resolution = Resolution::resolve(&topology, UnmatchedPolicy::DegradeToLowest).unwrap();

        assert_eq!(resolution.level_of(1, 1), Some(0));
        assert_eq!(
            resolution.diagnostics,
            vec![Diagnostic::Unmatched {
                domain: "core",
                subject: Subject::OperatingPoint {
                    device: "gpu",
                    rate: Hertz::from_mhz(307),
                },
                volt: MicroVolt(1_100_000),
            }]
        );
    }

    #[test]
    fn test_unmatched_rejected() {
        let topology = topology(&MPU, MicroVolt(1_100_000));
        let err = Resolution::resolve(&topology, UnmatchedPolicy::Reject).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedVoltage);
        assert_eq!(err.domain(), Some("core"));
    }

    #[test]
    fn test_duplicate_nominal_reported() {
        let levels = [MicroVolt(1_025_000), MicroVolt(1_200_000), MicroVolt(1_200_000)];
        let topology = topology(&levels, MicroVolt(1_127_000));
        let resolution = Resolution::resolve(&topology, UnmatchedPolicy::DegradeToLowest).unwrap();

        assert!(resolution.diagnostics.contains(&Diagnostic::AmbiguousLevel {
            domain: "mpu",
            volt: MicroVolt(1_200_000),
            first: 1,
            shadowed: 2,
        }));
        // 920 MHz at 1313000 no longer matches any level
        assert_eq!(resolution.level_of(0, 2), Some(0));
    }
}
