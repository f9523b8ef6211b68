//! # Voltage Domains
//!
//! A voltage domain is one regulated rail. It owns an ascending table of
//! voltage levels, the dependency tables stating what it requires from other
//! rails at each of its levels, and the list of votes consumers hold on it.
//!
//! All mutable state of a domain sits behind one fine-grained lock. The lock
//! only keeps the table, the dependency entries and the votes consistent
//! with each other; it is never held across a regulator call.

extern crate alloc;
use alloc::sync::Arc;
use alloc::vec::Vec;

use customvoltage_hal::{MicroVolt, Regulator};
use spin::{Mutex, MutexGuard};

use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::topology;
use crate::vote::{Vote, VoteList};

/// One performance level of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageLevel {
    /// Nominal voltage
    pub nominal: MicroVolt,
    /// Whether a calibrated value derived from `nominal` is still valid
    pub calibrated: bool,
}

impl VoltageLevel {
    /// A freshly declared, uncalibrated level
    pub const fn new(nominal: MicroVolt) -> Self {
        Self {
            nominal,
            calibrated: false,
        }
    }
}

/// "At `main_volt` on this domain, the other domain needs at least `dep_volt`"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Level of the owning (main) domain
    pub main_volt: MicroVolt,
    /// Requirement on the depended-on (shared) domain
    pub dep_volt: MicroVolt,
}

impl DependencyEntry {
    /// Build an entry from raw microvolt values
    pub const fn new(main_volt: u32, dep_volt: u32) -> Self {
        Self {
            main_volt: MicroVolt(main_volt),
            dep_volt: MicroVolt(dep_volt),
        }
    }

    /// End-of-table marker in raw dependency data
    pub const SENTINEL: DependencyEntry = DependencyEntry::new(0, 0);
}

/// Requirements of a main domain on one shared domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    /// Name of the shared domain
    pub dep_domain: &'static str,
    /// Entries, sentinel stripped
    pub entries: Vec<DependencyEntry>,
}

#[derive(Debug)]
pub(crate) struct DomainState {
    pub(crate) levels: Vec<VoltageLevel>,
    pub(crate) dep_tables: Vec<DependencyTable>,
    pub(crate) votes: VoteList,
    pub(crate) current: usize,
}

impl DomainState {
    pub(crate) fn nominals(&self) -> Vec<MicroVolt> {
        self.levels.iter().map(|l| l.nominal).collect()
    }
}

/// A regulated rail
pub struct VoltageDomain {
    name: &'static str,
    supplies: Vec<&'static str>,
    freq_device: Option<&'static str>,
    regulator: Arc<dyn Regulator>,
    state: Mutex<DomainState>,
}

impl core::fmt::Debug for VoltageDomain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoltageDomain")
            .field("name", &self.name)
            .field("supplies", &self.supplies)
            .field("freq_device", &self.freq_device)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl VoltageDomain {
    /// Create a domain from raw level data
    ///
    /// `volt_data` is read up to the first zero sentinel. The domain runs at
    /// level 0 until told otherwise.
    pub fn new(name: &'static str, volt_data: &[MicroVolt], regulator: Arc<dyn Regulator>) -> Self {
        Self {
            name,
            supplies: Vec::new(),
            freq_device: None,
            regulator,
            state: Mutex::new(DomainState {
                levels: topology::level_table(volt_data),
                dep_tables: Vec::new(),
                votes: VoteList::new(),
                current: 0,
            }),
        }
    }

    /// Declare the devices this rail supplies
    pub fn supplies(mut self, devices: &[&'static str]) -> Self {
        for &device in devices {
            if !self.supplies.contains(&device) {
                self.supplies.push(device);
            }
        }
        self
    }

    /// Declare the device whose frequencies label this domain's levels
    pub fn frequency_device(mut self, device: &'static str) -> Self {
        self.freq_device = Some(device);
        self.supplies(&[device])
    }

    /// Add a dependency table on `dep_domain`, raw data read up to the sentinel
    pub fn depends_on(self, dep_domain: &'static str, raw: &[DependencyEntry]) -> Self {
        self.state.lock().dep_tables.push(DependencyTable {
            dep_domain,
            entries: topology::dependency_entries(raw),
        });
        self
    }

    /// Domain name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Devices supplied by this rail
    pub fn supplied_devices(&self) -> &[&'static str] {
        &self.supplies
    }

    /// Frequency-bearing device, if any
    pub fn freq_device(&self) -> Option<&'static str> {
        self.freq_device
    }

    /// Number of levels
    pub fn level_count(&self) -> usize {
        self.state.lock().levels.len()
    }

    /// Copy of the level table, ascending
    pub fn levels(&self) -> Vec<VoltageLevel> {
        self.state.lock().levels.clone()
    }

    /// Nominal voltages, ascending
    pub fn nominals(&self) -> Vec<MicroVolt> {
        self.state.lock().nominals()
    }

    /// Copy of the dependency tables
    pub fn dependency_tables(&self) -> Vec<DependencyTable> {
        self.state.lock().dep_tables.clone()
    }

    /// Current operating level
    pub fn current_level(&self) -> usize {
        self.state.lock().current
    }

    /// Record the level the rail is running at
    pub fn set_current_level(&self, level: usize) -> VoltageResult<()> {
        let mut state = self.state.lock();
        if level >= state.levels.len() {
            return Err(self.level_error(level, state.levels.len()));
        }
        state.current = level;
        Ok(())
    }

    /// Mark a level's calibrated data as valid again
    pub fn mark_calibrated(&self, level: usize) -> VoltageResult<()> {
        let mut state = self.state.lock();
        let count = state.levels.len();
        match state.levels.get_mut(level) {
            Some(entry) => {
                entry.calibrated = true;
                Ok(())
            },
            None => Err(self.level_error(level, count)),
        }
    }

    /// Add or replace the vote of `consumer`
    pub fn vote(&self, consumer: &'static str, volt: MicroVolt) -> Option<MicroVolt> {
        self.state.lock().votes.add(consumer, volt)
    }

    /// Withdraw the vote of `consumer`
    pub fn unvote(&self, consumer: &'static str) -> Option<MicroVolt> {
        self.state.lock().votes.remove(consumer)
    }

    /// Votes in priority order
    pub fn votes(&self) -> Vec<Vote> {
        self.state.lock().votes.iter().copied().collect()
    }

    /// The winning vote
    pub fn highest_vote(&self) -> Option<Vote> {
        self.state.lock().votes.highest()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DomainState> {
        self.state.lock()
    }

    pub(crate) fn regulator(&self) -> &dyn Regulator {
        &*self.regulator
    }

    fn level_error(&self, level: usize, count: usize) -> VoltageError {
        VoltageError::from_kind(ErrorKind::LevelOutOfRange)
            .with_details(alloc::format!("level {} of {}", level, count))
            .with_domain(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullRegulator;

    fn domain() -> VoltageDomain {
        VoltageDomain::new(
            "mpu",
            &[MicroVolt(1_025_000), MicroVolt(1_200_000), MicroVolt::ZERO, MicroVolt(9)],
            Arc::new(NullRegulator),
        )
        .frequency_device("mpu")
        .depends_on(
            "core",
            &[
                DependencyEntry::new(1_025_000, 962_000),
                DependencyEntry::new(1_200_000, 1_127_000),
                DependencyEntry::SENTINEL,
            ],
        )
    }

    #[test]
    fn test_sentinel_terminates_tables() {
        let mpu = domain();
        assert_eq!(mpu.level_count(), 2);
        assert_eq!(mpu.dependency_tables()[0].entries.len(), 2);
        assert_eq!(mpu.supplied_devices(), &["mpu"]);
    }

    #[test]
    fn test_current_level_bounds() {
        let mpu = domain();
        assert!(mpu.set_current_level(1).is_ok());
        assert_eq!(mpu.current_level(), 1);

        let err = mpu.set_current_level(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LevelOutOfRange);
        assert_eq!(err.domain(), Some("mpu"));
    }

    #[test]
    fn test_mark_calibrated() {
        let mpu = domain();
        assert!(!mpu.levels()[0].calibrated);
        mpu.mark_calibrated(0).unwrap();
        assert!(mpu.levels()[0].calibrated);
        assert!(mpu.mark_calibrated(5).is_err());
    }

    #[test]
    fn test_votes() {
        let mpu = domain();
        mpu.vote("dss", MicroVolt(1_025_000));
        mpu.vote("gpu", MicroVolt(1_200_000));
        assert_eq!(mpu.highest_vote().map(|v| v.consumer), Some("gpu"));
        assert_eq!(mpu.unvote("gpu"), Some(MicroVolt(1_200_000)));
        assert_eq!(mpu.votes().len(), 1);
    }
}
