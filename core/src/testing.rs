//! Test fixtures.

extern crate alloc;
use alloc::sync::Arc;
use alloc::vec::Vec;

use customvoltage_hal::{Regulator, VoltTarget};
use spin::Mutex;

use crate::board;
use crate::config::EngineConfig;
use crate::context::{CustomVoltage, SerializationLock};
use crate::domain::VoltageDomain;
use crate::opp::DeviceHandle;

/// Regulator that does nothing
pub struct NullRegulator;

impl Regulator for NullRegulator {
    fn disable_reset_volt(&self, _domain: &'static str) {}
    fn enable(&self, _domain: &'static str, _target: VoltTarget) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatorCall {
    DisableReset(&'static str),
    Enable(&'static str, VoltTarget),
}

/// Regulator that records every call in order
#[derive(Default)]
pub struct RecordingRegulator {
    calls: Mutex<Vec<RegulatorCall>>,
}

impl RecordingRegulator {
    pub fn calls(&self) -> Vec<RegulatorCall> {
        self.calls.lock().clone()
    }
}

impl Regulator for RecordingRegulator {
    fn disable_reset_volt(&self, domain: &'static str) {
        self.calls.lock().push(RegulatorCall::DisableReset(domain));
    }

    fn enable(&self, domain: &'static str, target: VoltTarget) {
        self.calls.lock().push(RegulatorCall::Enable(domain, target));
    }
}

pub fn locks() -> (SerializationLock, SerializationLock) {
    (Arc::new(Mutex::new(())), Arc::new(Mutex::new(())))
}

/// OMAP4460 domains in mpu, iva, core order
pub fn omap4_domains(regulator: Arc<dyn Regulator>) -> Vec<VoltageDomain> {
    board::omap4460(regulator).domains
}

/// Initialized OMAP4460 engine with a recording regulator
pub fn omap4_context() -> (CustomVoltage, Arc<RecordingRegulator>, Vec<DeviceHandle>) {
    context_for(board::omap4460)
}

/// Initialized single-domain engine with a recording regulator
pub fn mpu_only_context() -> (CustomVoltage, Arc<RecordingRegulator>, Vec<DeviceHandle>) {
    context_for(board::omap4_mpu_only)
}

fn context_for(
    make: fn(Arc<dyn Regulator>) -> board::Board,
) -> (CustomVoltage, Arc<RecordingRegulator>, Vec<DeviceHandle>) {
    let regulator = Arc::new(RecordingRegulator::default());
    let board = make(regulator.clone());
    let devices = board.devices.clone();
    let (freq, dvfs) = locks();
    let cv = board
        .bring_up(EngineConfig::default(), freq, dvfs)
        .expect("board must bind");
    (cv, regulator, devices)
}
