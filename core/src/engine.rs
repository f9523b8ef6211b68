//! # Update & Propagation Engine
//!
//! Rewrites one domain's voltage table and carries the new values to
//! everything that mirrors them.
//!
//! ## Lock Order
//!
//! ```text
//!   freq lock (outer) ──▶ dvfs lock (inner) ──▶ domain state locks ──▶ opp table locks
//!                                               ascending DomainId
//! ```
//!
//! The outer and inner locks are shared with the frequency and voltage
//! scaling paths, which take them in the same order. The domain state locks
//! are released before the regulator is touched.
//!
//! ## Steps
//!
//! 1. validate the request (nothing is locked or written on failure)
//! 2. rekey outstanding votes from old to new level values
//! 3. commit nominals, clear calibration, rewrite bound operating points
//! 4. cascade into dependency entries indexed on the changed levels
//! 5. quiesce and re-arm the regulator against the current level

extern crate alloc;
use alloc::vec::Vec;

use customvoltage_hal::{MicroVolt, VoltTarget};
use spin::MutexGuard;

use crate::context::CustomVoltage;
use crate::domain::DomainState;
use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::topology::DomainId;

/// What one `apply` changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Levels rewritten (always the full table)
    pub levels_written: usize,
    /// Votes moved to a new key
    pub votes_rekeyed: usize,
    /// Operating points rewritten
    pub points_updated: usize,
    /// Dependency-entry fields rewritten
    pub entries_updated: usize,
}

impl CustomVoltage {
    /// Rewrite the voltage table of `id`
    ///
    /// `new_volts` is ascending by level. A vector shorter than the table
    /// replaces only the top levels; the low levels keep their values.
    pub fn apply(&self, id: DomainId, new_volts: &[MicroVolt]) -> VoltageResult<ApplyReport> {
        let bound = self.bound()?;
        let domain = self.domain(id)?;
        let topology = &bound.topology;
        let resolution = &bound.resolution;

        let count = topology
            .domain(id)
            .map(|node| node.levels.len())
            .ok_or_else(|| VoltageError::from_kind(ErrorKind::UnknownDomain))?;
        if new_volts.len() > count {
            return Err(VoltageError::from_kind(ErrorKind::TooManyValues)
                .with_details(alloc::format!("{} values for {} levels", new_volts.len(), count))
                .with_domain(domain.name()));
        }

        let freq_guard = bound.freq_lock.lock();
        let dvfs_guard = bound.dvfs_lock.lock();

        let mut touched: Vec<DomainId> = topology.dependents_of(id).collect();
        touched.push(id);
        touched.sort_unstable();
        touched.dedup();

        let mut guards: Vec<(DomainId, MutexGuard<'_, DomainState>)> = touched
            .iter()
            .map(|&d| (d, self.domains()[d.0].lock()))
            .collect();

        let mut report = ApplyReport::default();

        let (old, volts, target) = {
            let state = state_of(&mut guards, id)?;
            let old = state.nominals();
            let mut volts = old.clone();
            volts[count - new_volts.len()..].copy_from_slice(new_volts);

            report.votes_rekeyed = state.votes.rekey(&old, &volts);

            for (level, &volt) in state.levels.iter_mut().zip(volts.iter()) {
                level.nominal = volt;
                level.calibrated = false;
            }
            report.levels_written = volts.len();

            let target = VoltTarget {
                level: state.current,
                nominal: volts[state.current],
            };
            (old, volts, target)
        };

        for (device_index, device) in topology.devices_of(id) {
            let Some(handle) = &device.handle else {
                continue;
            };
            let updates = device
                .points
                .iter()
                .enumerate()
                .filter_map(|(point, bp)| {
                    let level = resolution.level_of(device_index, point)?;
                    Some((bp.slot, *volts.get(level)?))
                });
            report.points_updated += handle.set_voltages(updates);
        }

        for link in &resolution.cross {
            if link.main == id {
                if let Some(entry) = state_of(&mut guards, id)?
                    .dep_tables
                    .get_mut(link.table)
                    .and_then(|t| t.entries.get_mut(link.entry))
                {
                    entry.main_volt = volts[link.main_level];
                    report.entries_updated += 1;
                }
            }
            if link.dep == id {
                if let Some(entry) = state_of(&mut guards, link.main)?
                    .dep_tables
                    .get_mut(link.table)
                    .and_then(|t| t.entries.get_mut(link.entry))
                {
                    entry.dep_volt = volts[link.dep_level];
                    report.entries_updated += 1;
                }
            }
        }

        drop(guards);

        let regulator = domain.regulator();
        regulator.disable_reset_volt(domain.name());
        regulator.enable(domain.name(), target);

        drop(dvfs_guard);
        drop(freq_guard);

        log::debug!(
            "customvoltage: {} {:?} -> {:?} ({} votes, {} points, {} entries)",
            domain.name(),
            old,
            volts,
            report.votes_rekeyed,
            report.points_updated,
            report.entries_updated
        );

        Ok(report)
    }

    /// [`apply`](Self::apply) by domain name
    pub fn apply_by_name(&self, name: &str, new_volts: &[MicroVolt]) -> VoltageResult<ApplyReport> {
        let id = self.domain_id(name).ok_or_else(|| {
            VoltageError::from_kind(ErrorKind::UnknownDomain).with_details(alloc::string::String::from(name))
        })?;
        self.apply(id, new_volts)
    }
}

fn state_of<'a, 'g>(
    guards: &'a mut [(DomainId, MutexGuard<'g, DomainState>)],
    id: DomainId,
) -> VoltageResult<&'a mut DomainState> {
    guards
        .iter_mut()
        .find(|(d, _)| *d == id)
        .map(|(_, guard)| &mut **guard)
        .ok_or_else(|| VoltageError::from_kind(ErrorKind::UnknownDomain))
}
