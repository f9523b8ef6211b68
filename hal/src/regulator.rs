//! Regulator control.
//!
//! A rail under closed-loop control keeps regulating against the nominal it
//! was armed with. Before that nominal changes the loop must be stopped and
//! its calibrated offset thrown away; afterwards it is re-armed against the
//! level the rail is currently running at.
//!
//! Implementations report their own failures. The engine issues the calls
//! and does not look at an outcome.

use crate::units::MicroVolt;

/// The level a regulator is re-armed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltTarget {
    /// Index of the level in the domain's voltage table
    pub level: usize,
    /// Nominal voltage of that level after the update
    pub nominal: MicroVolt,
}

/// Closed-loop voltage control for one rail.
pub trait Regulator: Send + Sync {
    /// Stop regulation on `domain` and reset it to its nominal voltage,
    /// discarding any calibrated offset.
    fn disable_reset_volt(&self, domain: &'static str);

    /// Restart regulation on `domain` against `target`.
    fn enable(&self, domain: &'static str, target: VoltTarget);
}
