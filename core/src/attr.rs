//! # Text Interface
//!
//! The three attributes a platform exposes for each domain:
//!
//! | Attribute  | Direction | Format                                   |
//! |------------|-----------|------------------------------------------|
//! | voltages   | read      | `"<MHz>mhz: <mV> mV\n"`, highest first   |
//! | voltages   | write     | `"<mV> <mV> ..."`, highest first         |
//! | version    | read      | `"1\n"` single domain, `"2\n"` otherwise |
//!
//! Levels with no frequency label (any level of a rail without a
//! frequency-bearing device) are shown as `"<mV> mV\n"`.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use customvoltage_hal::MicroVolt;

use crate::config::ParseMode;
use crate::context::CustomVoltage;
use crate::error::{ErrorKind, VoltageError, VoltageResult};
use crate::topology::DomainId;
use crate::{SCHEMA_MULTI_DOMAIN, SCHEMA_SINGLE_DOMAIN};

impl CustomVoltage {
    /// Render the voltage table of `id`, highest level first
    pub fn show_voltages(&self, id: DomainId) -> VoltageResult<String> {
        self.bound()?;
        let domain = self.domain(id)?;
        let nominals = domain.nominals();

        let labels: Vec<Option<u64>> = (0..nominals.len())
            .map(|level| self.frequency_label(id, level))
            .collect();

        let mut out = String::new();
        for (level, volt) in nominals.iter().enumerate().rev() {
            let line = match labels[level] {
                Some(mhz) => alloc::format!("{}mhz: {} mV\n", mhz, volt.as_millivolts()),
                None => alloc::format!("{} mV\n", volt.as_millivolts()),
            };
            out.push_str(&line);
        }

        Ok(out)
    }

    /// Parse `buf` and apply it to `id`; returns the whole input length
    pub fn store_voltages(&self, id: DomainId, buf: &[u8]) -> VoltageResult<usize> {
        self.bound()?;
        let domain = self.domain(id)?;
        let volts = parse_millivolts(buf, domain.level_count(), self.config().parse)
            .map_err(|e| e.with_domain(domain.name()))?;
        self.apply(id, &volts)?;
        Ok(buf.len())
    }

    /// Render the interface schema version
    pub fn show_version(&self) -> String {
        let version = if self.domains().len() > 1 {
            SCHEMA_MULTI_DOMAIN
        } else {
            SCHEMA_SINGLE_DOMAIN
        };
        alloc::format!("{}\n", version)
    }

    fn frequency_label(&self, id: DomainId, level: usize) -> Option<u64> {
        let bound = self.bound().ok()?;
        let freq_device = self.domain(id).ok()?.freq_device()?;
        let (index, device) = bound
            .topology
            .devices_of(id)
            .find(|(_, d)| d.name == freq_device)?;
        device
            .points
            .iter()
            .enumerate()
            .find(|(point, _)| bound.resolution.level_of(index, *point) == Some(level))
            .map(|(_, p)| p.rate.as_mhz())
    }
}

/// Parse space-separated millivolts, highest level first
///
/// Input ends at the first NUL byte. At most `levels` values are taken.
/// The result is ascending by level and may be shorter than `levels`.
pub fn parse_millivolts(buf: &[u8], levels: usize, mode: ParseMode) -> VoltageResult<Vec<MicroVolt>> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let mut volts = Vec::with_capacity(levels);

    for token in buf[..end].split(|&b| b == b' ') {
        if volts.len() == levels {
            break;
        }
        let token = token.trim_ascii();
        if token.is_empty() {
            continue;
        }

        let digits = match mode {
            ParseMode::Lenient => {
                let unsigned = token.strip_prefix(b"+").unwrap_or(token);
                let run = unsigned.iter().take_while(|b| b.is_ascii_digit()).count();
                &unsigned[..run]
            },
            ParseMode::Strict => {
                if !token.iter().all(u8::is_ascii_digit) {
                    return Err(malformed(token));
                }
                token
            },
        };
        if digits.is_empty() {
            log::debug!("customvoltage: skipping token {:?}", Utf8(token));
            continue;
        }

        match millivolts(digits) {
            Some(volt) => volts.push(volt),
            None if mode == ParseMode::Strict => return Err(malformed(token)),
            None => log::debug!("customvoltage: skipping out-of-range {:?}", Utf8(token)),
        }
    }

    volts.reverse();
    Ok(volts)
}

fn millivolts(digits: &[u8]) -> Option<MicroVolt> {
    let mv = digits.iter().try_fold(0u32, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u32::from(d - b'0'))
    })?;
    MicroVolt::from_millivolts(mv)
}

fn malformed(token: &[u8]) -> VoltageError {
    VoltageError::from_kind(ErrorKind::MalformedInput).with_details(alloc::format!("{:?}", Utf8(token)))
}

struct Utf8<'a>(&'a [u8]);

impl core::fmt::Debug for Utf8<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
