//! In-memory transport.
//!
//! Incoming bytes are queued with [`MemoryTransport::feed`]; every
//! `write_bulk` call is recorded separately so a test can assert on the exact
//! write sequence. Reads never wait: a bulk read returns whatever is queued.

use std::collections::VecDeque;
use std::io;

use super::Transport;

#[derive(Debug, Default)]
pub struct MemoryTransport {
    incoming: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    byte_reads: usize,
    bulk_reads: usize,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the consumer to read.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes);
    }

    /// Every `write_bulk` payload, in call order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Drain recorded writes as one contiguous stream.
    pub fn take_written(&mut self) -> Vec<u8> {
        self.writes.drain(..).flatten().collect()
    }

    /// Bytes still queued for reading.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Number of `read_byte` plus `read_bulk` calls so far.
    pub fn read_calls(&self) -> usize {
        self.byte_reads + self.bulk_reads
    }

    pub fn bulk_reads(&self) -> usize {
        self.bulk_reads
    }

    /// Make subsequent writes fail with `BrokenPipe`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make subsequent `read_byte`/`read_bulk` calls fail with `ConnectionReset`.
    /// `bytes_available` keeps reporting the queue.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    fn check_read(&self) -> io::Result<()> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "read disabled"));
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.incoming.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.byte_reads += 1;
        self.check_read()?;
        Ok(self.incoming.pop_front())
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.bulk_reads += 1;
        self.check_read()?;
        let n = buf.len().min(self.incoming.len());
        for (dst, src) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write_bulk(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write disabled"));
        }
        self.writes.push(buf.to_vec());
        Ok(())
    }
}
