//! MCP4921/MCP4922 12-bit SPI DAC.
//!
//! Each write is one two-byte SPI transaction:
//!
//! ```text
//! bit 15    14    13    12    11..0
//!     A/B   BUF   GA    SHDN  D11..D0
//! ```
//!
//! `GA` = 1 selects 1x gain, `SHDN` = 1 keeps the output active. With an
//! optional LDAC (latch) pin both channels can be updated and then applied
//! together with [`Mcp492x::latch`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::SpiDevice;

/// Largest code the DAC accepts.
pub const MAX_VALUE: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

/// Configuration bits sent with every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DacFlags {
    pub buffered: bool,
    pub gain_1x: bool,
    pub active: bool,
}

impl Default for DacFlags {
    /// Unbuffered, 1x gain, output on.
    fn default() -> Self {
        Self {
            buffered: false,
            gain_1x: true,
            active: true,
        }
    }
}

/// The two bytes clocked out for one write. Values wider than 12 bits are masked.
pub fn command_word(channel: Channel, value: u16, flags: DacFlags) -> [u8; 2] {
    let config = (u8::from(channel == Channel::B) << 3)
        | (u8::from(flags.buffered) << 2)
        | (u8::from(flags.gain_1x) << 1)
        | u8::from(flags.active);
    let value = value & MAX_VALUE;
    [(config << 4) | (value >> 8) as u8, (value & 0xFF) as u8]
}

#[derive(Debug, thiserror::Error)]
pub enum DacError<S, P> {
    #[error("SPI transfer failed: {0:?}")]
    Spi(S),
    #[error("latch pin error: {0:?}")]
    Latch(P),
}

/// Stand-in pin type for a DAC wired without LDAC.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatch;

impl ErrorType for NoLatch {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoLatch {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Chip select is handled by the `SpiDevice`; the driver keeps no other state.
pub struct Mcp492x<SPI, P = NoLatch> {
    spi: SPI,
    latch: Option<P>,
}

impl<SPI: SpiDevice> Mcp492x<SPI, NoLatch> {
    pub fn new(spi: SPI) -> Self {
        Self { spi, latch: None }
    }
}

impl<SPI: SpiDevice, P: OutputPin> Mcp492x<SPI, P> {
    pub fn with_latch(spi: SPI, latch: P) -> Self {
        Self {
            spi,
            latch: Some(latch),
        }
    }

    /// Park the latch line high so writes are held until [`latch`](Self::latch).
    pub fn configure(&mut self) -> Result<(), DacError<SPI::Error, P::Error>> {
        if let Some(latch) = self.latch.as_mut() {
            latch.set_high().map_err(DacError::Latch)?;
        }
        Ok(())
    }

    pub fn write(
        &mut self,
        channel: Channel,
        value: u16,
        flags: DacFlags,
    ) -> Result<(), DacError<SPI::Error, P::Error>> {
        self.spi
            .write(&command_word(channel, value, flags))
            .map_err(DacError::Spi)
    }

    /// Channel A with default flags (the only channel on an MCP4921).
    pub fn write_value(&mut self, value: u16) -> Result<(), DacError<SPI::Error, P::Error>> {
        self.write(Channel::A, value, DacFlags::default())
    }

    /// Pulse LDAC low for at least 1 us. `Ok(false)` when no latch pin is wired.
    pub fn latch<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<bool, DacError<SPI::Error, P::Error>> {
        let Some(latch) = self.latch.as_mut() else {
            return Ok(false);
        };
        latch.set_low().map_err(DacError::Latch)?;
        delay.delay_us(1);
        latch.set_high().map_err(DacError::Latch)?;
        Ok(true)
    }

    pub fn release(self) -> (SPI, Option<P>) {
        (self.spi, self.latch)
    }
}
