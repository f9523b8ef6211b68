//! Board descriptions.
//!
//! Static voltage and operating-point data for the SoCs the engine ships
//! with. A board is plain data; [`Board::bring_up`] performs the
//! registration sequence a platform would otherwise do by hand.

extern crate alloc;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use customvoltage_hal::{Hertz, MicroVolt, Regulator};

use crate::config::EngineConfig;
use crate::context::{CustomVoltage, SerializationLock};
use crate::domain::{DependencyEntry, VoltageDomain};
use crate::error::VoltageResult;
use crate::opp::{DeviceHandle, OperatingPoint, OppTable};

/// Domains plus the operating-point tables of the devices they supply
#[derive(Debug)]
pub struct Board {
    /// Voltage domains, in declaration order
    pub domains: Vec<VoltageDomain>,
    /// Device tables, registered in this order
    pub devices: Vec<DeviceHandle>,
}

impl Board {
    /// Register every device and both locks, then initialize
    pub fn bring_up(
        self,
        config: EngineConfig,
        freq_lock: SerializationLock,
        dvfs_lock: SerializationLock,
    ) -> VoltageResult<CustomVoltage> {
        let mut cv = CustomVoltage::new(self.domains, config);
        cv.register_freq_lock(freq_lock);
        cv.register_dvfs_lock(dvfs_lock);
        for device in self.devices {
            cv.register_opp_device(device.name(), device);
        }
        cv.init()?;
        Ok(cv)
    }
}

// =============================================================================
// OMAP4460
// =============================================================================

const MPU_VOLT: [MicroVolt; 6] = [
    MicroVolt(1_025_000),
    MicroVolt(1_200_000),
    MicroVolt(1_313_000),
    MicroVolt(1_375_000),
    MicroVolt(1_389_000),
    MicroVolt::ZERO,
];

const IVA_VOLT: [MicroVolt; 5] = [
    MicroVolt(962_000),
    MicroVolt(1_114_000),
    MicroVolt(1_291_000),
    MicroVolt(1_375_000),
    MicroVolt::ZERO,
];

const CORE_VOLT: [MicroVolt; 4] = [
    MicroVolt(962_000),
    MicroVolt(1_127_000),
    MicroVolt(1_250_000),
    MicroVolt::ZERO,
];

const MPU_CORE_DEP: [DependencyEntry; 6] = [
    DependencyEntry::new(1_025_000, 962_000),
    DependencyEntry::new(1_200_000, 1_127_000),
    DependencyEntry::new(1_313_000, 1_127_000),
    DependencyEntry::new(1_375_000, 1_250_000),
    DependencyEntry::new(1_389_000, 1_250_000),
    DependencyEntry::SENTINEL,
];

const IVA_CORE_DEP: [DependencyEntry; 5] = [
    DependencyEntry::new(962_000, 962_000),
    DependencyEntry::new(1_114_000, 1_127_000),
    DependencyEntry::new(1_291_000, 1_127_000),
    DependencyEntry::new(1_375_000, 1_250_000),
    DependencyEntry::SENTINEL,
];

fn table(name: &'static str, points: &[(u64, MicroVolt)]) -> DeviceHandle {
    OppTable::shared(
        name,
        points
            .iter()
            .map(|&(hz, volt)| OperatingPoint::new(Hertz(hz), volt))
            .collect(),
    )
}

fn mpu_table() -> DeviceHandle {
    table(
        "mpu",
        &[
            (350_000_000, MPU_VOLT[0]),
            (700_000_000, MPU_VOLT[1]),
            (920_000_000, MPU_VOLT[2]),
            (1_200_000_000, MPU_VOLT[3]),
            (1_500_000_000, MPU_VOLT[4]),
        ],
    )
}

/// OMAP4460: mpu and iva depend on the shared core rail
pub fn omap4460(regulator: Arc<dyn Regulator>) -> Board {
    let domains = vec![
        VoltageDomain::new("mpu", &MPU_VOLT, regulator.clone())
            .frequency_device("mpu")
            .depends_on("core", &MPU_CORE_DEP),
        VoltageDomain::new("iva", &IVA_VOLT, regulator.clone())
            .frequency_device("iva")
            .supplies(&["dsp", "aess"])
            .depends_on("core", &IVA_CORE_DEP),
        VoltageDomain::new("core", &CORE_VOLT, regulator)
            .supplies(&["l3", "gpu", "fdif", "hsi"]),
    ];

    let devices = vec![
        mpu_table(),
        table(
            "iva",
            &[
                (133_000_000, IVA_VOLT[0]),
                (266_000_000, IVA_VOLT[1]),
                (332_000_000, IVA_VOLT[2]),
                (430_000_000, IVA_VOLT[3]),
            ],
        ),
        table(
            "dsp",
            &[
                (232_800_000, IVA_VOLT[0]),
                (465_600_000, IVA_VOLT[1]),
                (496_000_000, IVA_VOLT[2]),
            ],
        ),
        table("aess", &[(98_304_000, IVA_VOLT[0]), (196_608_000, IVA_VOLT[1])]),
        table("l3", &[(100_000_000, CORE_VOLT[0]), (200_000_000, CORE_VOLT[1])]),
        table(
            "gpu",
            &[
                (153_600_000, CORE_VOLT[0]),
                (307_200_000, CORE_VOLT[1]),
                (384_000_000, CORE_VOLT[2]),
            ],
        ),
        table("fdif", &[(64_000_000, CORE_VOLT[0]), (128_000_000, CORE_VOLT[1])]),
        table("hsi", &[(96_000_000, CORE_VOLT[0]), (192_000_000, CORE_VOLT[1])]),
    ];

    Board { domains, devices }
}

/// Single-domain variant: only the mpu rail is exposed
pub fn omap4_mpu_only(regulator: Arc<dyn Regulator>) -> Board {
    Board {
        domains: vec![VoltageDomain::new("mpu", &MPU_VOLT, regulator).frequency_device("mpu")],
        devices: vec![mpu_table()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{locks, NullRegulator};

    #[test]
    fn test_omap4460_binds_cleanly() {
        let (freq, dvfs) = locks();
        let cv = omap4460(Arc::new(NullRegulator))
            .bring_up(EngineConfig::default(), freq, dvfs)
            .unwrap();

        assert_eq!(cv.domains().len(), 3);
        assert_eq!(cv.registry().len(), 8);
        assert!(cv.diagnostics().is_empty());

        let topology = cv.topology().unwrap();
        let points: usize = topology.devices.iter().map(|d| d.points.len()).sum();
        assert_eq!(points, 5 + 4 + 3 + 2 + 2 + 3 + 2 + 2);
        assert_eq!(cv.resolution().unwrap().cross.len(), 9);
    }

    #[test]
    fn test_mpu_only() {
        let (freq, dvfs) = locks();
        let cv = omap4_mpu_only(Arc::new(NullRegulator))
            .bring_up(EngineConfig::default(), freq, dvfs)
            .unwrap();

        assert_eq!(cv.domains().len(), 1);
        assert_eq!(cv.domain(cv.domain_id("mpu").unwrap()).unwrap().level_count(), 5);
        assert!(cv.resolution().unwrap().cross.is_empty());
    }
}
