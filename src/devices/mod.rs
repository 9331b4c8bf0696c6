//! # Board Peripherals
//!
//! Drivers for the hardware the controller talks to besides the host:
//!
//! - [`dac`] - MCP492X 12-bit SPI DAC (via `embedded-hal` traits)
//! - [`sbus`] - SBUS radio receiver decoder (over any [`Transport`](crate::transport::Transport))

pub mod dac;
pub mod sbus;

pub use dac::{Channel, DacFlags, Mcp492x};
pub use sbus::{SbusFrame, SbusRx};
