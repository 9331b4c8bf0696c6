//! USB/UART transport backed by the `serialport` crate.

use std::io::{self, Read, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{debug, trace, warn};
use serialport::SerialPort;

use super::Transport;
use crate::logutil::hex_snippet;

/// SBUS line rate.
pub const SBUS_BAUD: u32 = 100_000;

/// Line settings for [`SerialTransport::open`].
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    /// Upper bound for a single bulk read.
    pub read_timeout: Duration,
    /// Assert DTR/RTS and drop whatever the device printed while booting.
    pub reset_lines: bool,
}

impl SerialSettings {
    /// 8N1 host link.
    pub fn host_link(port: &str, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            read_timeout,
            reset_lines: true,
        }
    }

    /// 100000 baud 8E2 receiver input (line inversion is left to the adapter).
    pub fn sbus(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: SBUS_BAUD,
            parity: serialport::Parity::Even,
            stop_bits: serialport::StopBits::Two,
            read_timeout: Duration::from_millis(1),
            reset_lines: false,
        }
    }
}

pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
}

impl SerialTransport {
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        debug!(
            "Opening serial port {} at {} baud",
            settings.port, settings.baud_rate
        );

        let builder = serialport::new(settings.port.as_str(), settings.baud_rate)
            .timeout(settings.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits);
        let mut port = builder
            .open()
            .map_err(|e| anyhow!("Failed to open serial port {}: {}", settings.port, e))?;

        if settings.reset_lines {
            // Boards with native USB only start streaming once DTR is up
            let _ = port.write_data_terminal_ready(true);
            let _ = port.write_request_to_send(true);
            sleep(Duration::from_millis(150));

            let mut purge_buf = [0u8; 512];
            if let Ok(available) = port.bytes_to_read() {
                if available > 0 {
                    let _ = port.read(&mut purge_buf);
                    debug!("Purged {} stale bytes from {}", available, settings.port);
                }
            }
        }

        debug!("Serial port {} initialized", settings.port);
        Ok(Self {
            name: settings.port.clone(),
            port,
            read_timeout: settings.read_timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let started = Instant::now();
        let port = &mut self.port;
        let result = fill_within(
            buf,
            self.read_timeout,
            || started.elapsed(),
            |chunk, remaining| {
                port.set_timeout(remaining)?;
                port.read(chunk)
            },
        );
        // Single-byte polls expect the configured timeout back
        self.port.set_timeout(self.read_timeout)?;
        let filled = result.map_err(|e| {
            warn!("Serial read error on {}: {}", self.name, e);
            e
        })?;
        trace!(
            "{} bulk read {}/{} bytes: {}",
            self.name,
            filled,
            buf.len(),
            hex_snippet(&buf[..filled], 32)
        );
        Ok(filled)
    }

    fn write_bulk(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        trace!("{} wrote {} bytes: {}", self.name, buf.len(), hex_snippet(buf, 32));
        Ok(())
    }
}

/// Fill `buf` until it is full, the source times out, or `budget` is spent.
/// Each read is handed what is left of the budget as its own timeout.
fn fill_within<E, R>(
    buf: &mut [u8],
    budget: Duration,
    mut elapsed: E,
    mut read: R,
) -> io::Result<usize>
where
    E: FnMut() -> Duration,
    R: FnMut(&mut [u8], Duration) -> io::Result<usize>,
{
    let mut filled = 0;
    while filled < buf.len() {
        let remaining = budget.saturating_sub(elapsed());
        if remaining.is_zero() {
            break;
        }
        match read(&mut buf[filled..], remaining) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
