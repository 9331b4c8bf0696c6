//! # Host Link
//!
//! Multiplexes a fixed, ordered set of caller-owned objects into one framed
//! message per direction over a byte [`Transport`]:
//!
//! ```text
//! [header: 4 bytes LE, iff header != 0]
//! [payload: attached objects back to back, in attach order]
//! [terminator: 4 bytes LE, iff terminator != 0]
//! ```
//!
//! Memory is fixed at construction: two `BUF_SIZE` scratch buffers and at
//! most `MAX_OBJS` slots per direction, nothing allocated afterwards.
//!
//! ## Usage
//!
//! ```rust
//! use boardlink::link::{Link, Region};
//! use boardlink::transport::MemoryTransport;
//!
//! let command = Region::with_bytes([0x12, 0x34]);
//! let mut link = Link::new(MemoryTransport::new(), 0, 0);
//! assert!(link.attach_tx(command.cells()));
//! assert!(link.send());
//! assert_eq!(link.transport().unwrap().writes(), &[vec![0x12, 0x34]]);
//! ```
//!
//! Objects are attached once during setup. Attaching after traffic has
//! started is not rejected, but it silently changes the frame layout the
//! other end expects.
//!
//! ## Receive timing
//!
//! `receive()` returns at once when nothing is buffered. Otherwise it polls
//! the transport until the frame is complete or the timeout (500 us by
//! default) elapses, measured from the start of the call. A timed-out or
//! rejected frame is discarded entirely; the next call starts from scratch.
//! The link itself never logs; callers decide what a failure is worth.

use serde::{Deserialize, Serialize};

use crate::transport::Transport;

pub mod assembler;
pub mod clock;
pub mod error;
pub mod parser;
pub mod region;
pub mod registry;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{Delimiter, LinkError};
pub use parser::{FrameParser, RxState};
pub use region::{as_cells, Packed, Region};
pub use registry::{SlotList, PAYLOAD_LIMIT};

use std::cell::Cell;

/// Scratch buffer size per direction.
pub const BUF_SIZE: usize = 256;
/// Slots per direction.
pub const MAX_OBJS: usize = 4;
/// Scratch bytes held back for header and terminator.
pub const FRAME_RESERVE: usize = 8;
/// Receive budget per call.
pub const DEFAULT_TIMEOUT_US: u64 = 500;
/// Disables the header.
pub const NULL_HEADER: u32 = 0x0000_0000;
/// Disables the terminator.
pub const NULL_TERMINATOR: u32 = 0x0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub header: u32,
    pub terminator: u32,
    pub timeout_us: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            header: NULL_HEADER,
            terminator: NULL_TERMINATOR,
            timeout_us: DEFAULT_TIMEOUT_US,
        }
    }
}

pub struct Link<'a, T, C = MonotonicClock> {
    transport: Option<T>,
    clock: C,
    header: u32,
    terminator: u32,
    timeout_us: u64,
    tx: SlotList<'a>,
    rx: SlotList<'a>,
    tx_buf: [u8; BUF_SIZE],
    rx_buf: [u8; BUF_SIZE],
}

impl<'a, T: Transport> Link<'a, T> {
    /// Pass [`NULL_HEADER`] / [`NULL_TERMINATOR`] to leave either delimiter off.
    pub fn new(transport: T, header: u32, terminator: u32) -> Self {
        Self::with_config(
            transport,
            &LinkConfig {
                header,
                terminator,
                ..LinkConfig::default()
            },
        )
    }

    pub fn with_config(transport: T, config: &LinkConfig) -> Self {
        let mut link = Self::unbound(config);
        link.transport = Some(transport);
        link
    }

    /// A link with no transport yet; `send`/`receive` fail until [`bind`](Self::bind).
    pub fn unbound(config: &LinkConfig) -> Self {
        Self {
            transport: None,
            clock: MonotonicClock::new(),
            header: config.header,
            terminator: config.terminator,
            timeout_us: config.timeout_us,
            tx: SlotList::new(),
            rx: SlotList::new(),
            tx_buf: [0; BUF_SIZE],
            rx_buf: [0; BUF_SIZE],
        }
    }
}

impl<'a, T: Transport, C: Clock> Link<'a, T, C> {
    /// Swap the receive-deadline time source.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Link<'a, T, C2> {
        Link {
            transport: self.transport,
            clock,
            header: self.header,
            terminator: self.terminator,
            timeout_us: self.timeout_us,
            tx: self.tx,
            rx: self.rx,
            tx_buf: self.tx_buf,
            rx_buf: self.rx_buf,
        }
    }

    /// Attach the transport, returning the previous one if any.
    pub fn bind(&mut self, transport: T) -> Option<T> {
        self.transport.replace(transport)
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    pub fn header(&self) -> u32 {
        self.header
    }

    pub fn terminator(&self) -> u32 {
        self.terminator
    }

    pub fn timeout_us(&self) -> u64 {
        self.timeout_us
    }

    pub fn tx_slots(&self) -> usize {
        self.tx.len()
    }

    pub fn rx_slots(&self) -> usize {
        self.rx.len()
    }

    /// Payload bytes per transmitted frame.
    pub fn tx_bytes(&self) -> usize {
        self.tx.total_bytes()
    }

    /// Payload bytes per received frame.
    pub fn rx_bytes(&self) -> usize {
        self.rx.total_bytes()
    }

    /// Add an object to the transmit frame. `false` means it was not attached.
    pub fn attach_tx(&mut self, region: &'a [Cell<u8>]) -> bool {
        self.try_attach_tx(region).is_ok()
    }

    /// Add an object to the receive frame. `false` means it was not attached.
    pub fn attach_rx(&mut self, region: &'a [Cell<u8>]) -> bool {
        self.try_attach_rx(region).is_ok()
    }

    pub fn try_attach_tx(&mut self, region: &'a [Cell<u8>]) -> Result<(), LinkError> {
        self.tx.attach(region)
    }

    pub fn try_attach_rx(&mut self, region: &'a [Cell<u8>]) -> Result<(), LinkError> {
        self.rx.attach(region)
    }

    /// Frame the current contents of every transmit object and write them.
    pub fn send(&mut self) -> bool {
        self.try_send().is_ok()
    }

    /// Read one frame into the receive objects.
    pub fn receive(&mut self) -> bool {
        self.try_receive().is_ok()
    }

    /// Like [`send`](Self::send); returns the frame length on success.
    ///
    /// Exactly one `write_bulk` per successful call, none on failure.
    pub fn try_send(&mut self) -> Result<usize, LinkError> {
        let transport = self.transport.as_mut().ok_or(LinkError::Unbound)?;
        if self.tx.is_empty() {
            return Err(LinkError::NothingAttached);
        }
        let len = assembler::assemble(self.header, self.terminator, &self.tx, &mut self.tx_buf)?;
        transport.write_bulk(&self.tx_buf[..len])?;
        Ok(len)
    }

    /// Like [`receive`](Self::receive) with the failure cause.
    ///
    /// Receive objects are written only when the whole frame matched.
    pub fn try_receive(&mut self) -> Result<(), LinkError> {
        let transport = self.transport.as_mut().ok_or(LinkError::Unbound)?;
        if self.rx.is_empty() {
            return Err(LinkError::NothingAttached);
        }
        if transport.bytes_available()? == 0 {
            return Err(LinkError::NoData);
        }

        let start = self.clock.now_us();
        let payload = &mut self.rx_buf[..self.rx.total_bytes()];
        let mut parser = FrameParser::new(self.header, self.terminator);
        loop {
            let elapsed_us = self.clock.now_us().wrapping_sub(start);
            if elapsed_us > self.timeout_us {
                return Err(LinkError::Timeout {
                    timeout_us: self.timeout_us,
                    elapsed_us,
                });
            }
            if transport.bytes_available()? == 0 {
                std::hint::spin_loop();
                continue;
            }
            if parser.step(transport, payload)? == RxState::Done {
                break;
            }
        }

        self.rx.scatter(payload);
        Ok(())
    }
}
