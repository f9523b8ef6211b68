//! Electrical units.
//!
//! Voltages travel through the engine in microvolts and frequencies in hertz,
//! matching what the operating-point and voltage-domain registries store.
//! The text interface speaks millivolts and megahertz, so the conversions
//! live next to the types.

use core::fmt;

use static_assertions::{assert_eq_size, const_assert};

/// A voltage in microvolts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MicroVolt(pub u32);

/// A frequency in hertz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Hertz(pub u64);

assert_eq_size!(MicroVolt, u32);
assert_eq_size!(Hertz, u64);

const MICROVOLTS_PER_MILLIVOLT: u32 = 1_000;
const HERTZ_PER_MEGAHERTZ: u64 = 1_000_000;

const_assert!(MICROVOLTS_PER_MILLIVOLT == 1_000);

impl MicroVolt {
    /// Zero volts; also the end-of-table sentinel in raw level data.
    pub const ZERO: MicroVolt = MicroVolt(0);

    /// Convert from millivolts, `None` on overflow.
    pub const fn from_millivolts(mv: u32) -> Option<Self> {
        match mv.checked_mul(MICROVOLTS_PER_MILLIVOLT) {
            Some(uv) => Some(MicroVolt(uv)),
            None => None,
        }
    }

    /// Whole millivolts, truncating.
    pub const fn as_millivolts(self) -> u32 {
        self.0 / MICROVOLTS_PER_MILLIVOLT
    }

    /// Raw microvolt value.
    pub const fn as_microvolts(self) -> u32 {
        self.0
    }

    /// True for the sentinel value.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Hertz {
    /// Build from megahertz.
    pub const fn from_mhz(mhz: u64) -> Self {
        Hertz(mhz * HERTZ_PER_MEGAHERTZ)
    }

    /// Whole megahertz, truncating.
    pub const fn as_mhz(self) -> u64 {
        self.0 / HERTZ_PER_MEGAHERTZ
    }
}

impl From<MicroVolt> for u32 {
    fn from(volt: MicroVolt) -> Self {
        volt.0
    }
}

impl From<Hertz> for u64 {
    fn from(freq: Hertz) -> Self {
        freq.0
    }
}

impl fmt::Display for MicroVolt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} uV", self.0)
    }
}

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millivolt_conversion() {
        assert_eq!(MicroVolt::from_millivolts(1200), Some(MicroVolt(1_200_000)));
        assert_eq!(MicroVolt(1_313_000).as_millivolts(), 1313);
        assert_eq!(MicroVolt(999).as_millivolts(), 0);
    }

    #[test]
    fn test_millivolt_overflow() {
        assert_eq!(MicroVolt::from_millivolts(u32::MAX), None);
        assert_eq!(MicroVolt::from_millivolts(4_294_967), Some(MicroVolt(4_294_967_000)));
        assert_eq!(MicroVolt::from_millivolts(4_294_968), None);
    }

    #[test]
    fn test_megahertz_conversion() {
        assert_eq!(Hertz::from_mhz(1200), Hertz(1_200_000_000));
        assert_eq!(Hertz(98_304_000).as_mhz(), 98);
    }

    #[test]
    fn test_sentinel() {
        assert!(MicroVolt::ZERO.is_zero());
        assert!(!MicroVolt(1).is_zero());
    }
}
