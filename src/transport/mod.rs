//! # Byte Transports
//!
//! The link and the SBUS receiver both sit on top of a plain bidirectional
//! byte stream. The stream's lifecycle (opening, baud rate, closing) belongs
//! to the caller; consumers only poll, read and write.
//!
//! - [`MemoryTransport`] - in-memory queue for tests, loopback and simulation
//! - [`SerialTransport`] - USB/UART port via `serialport` (feature `serial`)

use std::io;

pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;

pub use memory::MemoryTransport;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;

pub trait Transport {
    /// Bytes that can be read right now without waiting.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Consume one byte, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Fill as much of `buf` as arrives within the transport's read timeout;
    /// returns the count actually read. The timeout bounds the whole call,
    /// not each underlying read.
    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole of `buf` in one go.
    fn write_bulk(&mut self, buf: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_bulk(buf)
    }

    fn write_bulk(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_bulk(buf)
    }
}
