//! # CustomVoltage Core
//!
//! Runtime override of the nominal voltage tables of a multi-domain SoC.
//!
//! A SoC exposes several regulated rails. Each rail (voltage domain) has a
//! small ascending table of voltage levels, and many values elsewhere mirror
//! those levels: device operating points, requirements one rail places on
//! another, outstanding voltage votes. Overriding a table means rewriting
//! every mirror consistently while the frequency-scaling path keeps running.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                      CustomVoltage                            │
//!   │   register_* ──▶ init ──▶ Topology ──▶ Resolution (indices)   │
//!   └──────────────────────────────────────────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//!   show/store/version  ─────────────▶  apply (engine)
//!                                              │
//!          ┌──────────────┬────────────────────┼──────────────┐
//!          ▼              ▼                    ▼              ▼
//!     level table     vote list          opp tables     dependency
//!     (domain lock)   (rekeyed)          (rwlock)       entries
//! ```
//!
//! Indices are resolved once at init. Updates never compare voltages; they
//! write through the recorded indices.
//!
//! ## Modules
//!
//! - [`context`]: engine lifecycle and queries
//! - [`topology`]: immutable shape of domains and devices
//! - [`dependency`]: index resolution and diagnostics
//! - [`engine`]: table updates and propagation
//! - [`attr`]: text interface
//! - [`board`]: reference board descriptions

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod attr;
pub mod board;
pub mod config;
pub mod context;
pub mod dependency;
pub mod domain;
pub mod engine;
pub mod error;
pub mod opp;
pub mod registry;
pub mod topology;
pub mod vote;

#[cfg(test)]
mod testing;

pub use attr::parse_millivolts;
pub use config::{EngineConfig, ParseMode, UnmatchedPolicy};
pub use context::{CustomVoltage, SerializationLock};
pub use dependency::{CrossDomainIndex, Diagnostic, Resolution, Subject};
pub use domain::{DependencyEntry, DependencyTable, VoltageDomain, VoltageLevel};
pub use engine::ApplyReport;
pub use error::{ErrorKind, VoltageError, VoltageResult};
pub use opp::{DeviceHandle, OperatingPoint, OppTable};
pub use registry::{DeviceRegistry, Registration};
pub use topology::{DomainId, DomainRole, Topology};
pub use vote::{Vote, VoteList};

pub use customvoltage_hal::{Hertz, MicroVolt, Regulator, VoltTarget};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Interface schema of a single-domain deployment
pub const SCHEMA_SINGLE_DOMAIN: u32 = 1;

/// Interface schema of a multi-domain deployment
pub const SCHEMA_MULTI_DOMAIN: u32 = 2;

static_assertions::const_assert!(SCHEMA_SINGLE_DOMAIN < SCHEMA_MULTI_DOMAIN);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::omap4_context;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_end_to_end() {
        let (cv, regulator, _) = omap4_context();
        let core = cv.domain_id("core").unwrap();

        cv.store_voltages(core, b"1200 1100 950\n").unwrap();

        assert_eq!(cv.show_voltages(core).unwrap(), "1200 mV\n1100 mV\n950 mV\n");
        let mpu = cv.domain(cv.domain_id("mpu").unwrap()).unwrap();
        assert_eq!(
            mpu.dependency_tables()[0].entries[0].dep_volt,
            MicroVolt(950_000)
        );
        assert_eq!(regulator.calls().len(), 2);
    }
}
