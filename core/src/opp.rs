//! Operating-point tables.
//!
//! A device is known to the engine only through its table of
//! (frequency, voltage) operating points. The table is shared with the
//! frequency-scaling path, which reads voltages from it, so points live
//! behind a lock and are addressed by their slot in the table.

extern crate alloc;
use alloc::sync::Arc;
use alloc::vec::Vec;

use customvoltage_hal::{Hertz, MicroVolt};
use spin::RwLock;

/// A (frequency, voltage) pair a device may run at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingPoint {
    /// Frequency
    pub rate: Hertz,
    /// Voltage, mirrored from a level of the supplying domain
    pub u_volt: MicroVolt,
    /// Unavailable points are never indexed
    pub available: bool,
}

impl OperatingPoint {
    /// An available operating point
    pub const fn new(rate: Hertz, u_volt: MicroVolt) -> Self {
        Self {
            rate,
            u_volt,
            available: true,
        }
    }

    /// A point present in the table but disabled
    pub const fn unavailable(rate: Hertz, u_volt: MicroVolt) -> Self {
        Self {
            rate,
            u_volt,
            available: false,
        }
    }
}

/// Operating-point table of one device
#[derive(Debug)]
pub struct OppTable {
    name: &'static str,
    points: RwLock<Vec<OperatingPoint>>,
}

/// Shared handle through which a device is registered
pub type DeviceHandle = Arc<OppTable>;

impl OppTable {
    /// Create a table
    pub fn new(name: &'static str, points: Vec<OperatingPoint>) -> Self {
        Self {
            name,
            points: RwLock::new(points),
        }
    }

    /// Create a shareable handle
    pub fn shared(name: &'static str, points: Vec<OperatingPoint>) -> DeviceHandle {
        Arc::new(Self::new(name, points))
    }

    /// Device name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of points, available or not
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Copy of every point in table order
    pub fn snapshot(&self) -> Vec<OperatingPoint> {
        self.points.read().clone()
    }

    /// Point at `slot`
    pub fn get(&self, slot: usize) -> Option<OperatingPoint> {
        self.points.read().get(slot).copied()
    }

    /// Rewrite the voltage of each `(slot, voltage)` pair under one write lock
    ///
    /// Slots past the end are skipped; slots come from the topology built
    /// over this same table and tables never shrink.
    pub(crate) fn set_voltages(&self, updates: impl IntoIterator<Item = (usize, MicroVolt)>) -> usize {
        let mut points = self.points.write();
        let mut written = 0;
        for (slot, u_volt) in updates {
            if let Some(point) = points.get_mut(slot) {
                point.u_volt = u_volt;
                written += 1;
            }
        }
        written
    }
}
