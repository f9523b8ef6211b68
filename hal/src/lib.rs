//! # customvoltage HAL
//!
//! The hardware boundary of the voltage override engine.
//!
//! The engine never drives a regulator itself. It only needs to quiesce a
//! rail before rewriting its voltage table and re-arm it afterwards, and it
//! needs a common vocabulary for the electrical quantities it moves around.
//! Both live here so that platform code can implement [`Regulator`] without
//! pulling in the engine.
//!
//! ```text
//! ┌──────────────────────┐        ┌───────────────────────────┐
//! │  customvoltage-core  │ ─────▶ │  Regulator (this crate)   │
//! │  apply()             │        │  disable_reset_volt()     │
//! │                      │        │  enable(VoltTarget)       │
//! └──────────────────────┘        └───────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod regulator;
pub mod units;

pub use regulator::{Regulator, VoltTarget};
pub use units::{Hertz, MicroVolt};
