//! SBUS receiver decoder.
//!
//! SBUS frames are 25 bytes at 100000 baud, 8E2:
//!
//! ```text
//! [0x0F] [22 bytes: 16 x 11-bit channels, LSB first] [flags] [footer]
//! ```
//!
//! Flags: bit0 = ch17, bit1 = ch18, bit2 = lost frame, bit3 = failsafe.
//! The footer is `0x00`, or has `0x04` in its low nibble on receivers that
//! cycle a telemetry slot counter in the high nibble. A header byte only
//! starts a frame when the byte before it looked like a footer, which keeps
//! the decoder from locking onto a `0x0F` inside channel data.

use std::io;

use crate::link::Packed;
use crate::transport::Transport;

pub const FRAME_LEN: usize = 25;
pub const NUM_CH: usize = 16;
pub const HEADER: u8 = 0x0F;
pub const FOOTER: u8 = 0x00;
pub const FOOTER2: u8 = 0x04;
const CH17_MASK: u8 = 0x01;
const CH18_MASK: u8 = 0x02;
const LOST_FRAME_MASK: u8 = 0x04;
const FAILSAFE_MASK: u8 = 0x08;
const CH_BITS: usize = 11;
const CH_MASK: u32 = 0x07FF;

/// Bytes per [`SbusFrame`] when attached to the host link.
pub const PACKED_LEN: usize = NUM_CH * 2 + 4;

fn is_footer(byte: u8) -> bool {
    byte == FOOTER || (byte & 0x0F) == FOOTER2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbusFrame {
    pub channels: [i16; NUM_CH],
    pub ch17: bool,
    pub ch18: bool,
    pub lost_frame: bool,
    pub failsafe: bool,
}

impl Default for SbusFrame {
    /// No frame seen yet: report lost and failsafe until the receiver says otherwise.
    fn default() -> Self {
        Self {
            channels: [0; NUM_CH],
            ch17: false,
            ch18: false,
            lost_frame: true,
            failsafe: true,
        }
    }
}

impl SbusFrame {
    /// Decode a raw frame; `None` if the header or footer is wrong.
    pub fn decode(buf: &[u8; FRAME_LEN]) -> Option<Self> {
        if buf[0] != HEADER || !is_footer(buf[FRAME_LEN - 1]) {
            return None;
        }
        let mut channels = [0i16; NUM_CH];
        for (i, ch) in channels.iter_mut().enumerate() {
            let bit = i * CH_BITS;
            let at = 1 + bit / 8;
            let raw = u32::from(buf[at])
                | u32::from(buf[at + 1]) << 8
                | u32::from(buf[at + 2]) << 16;
            *ch = ((raw >> (bit % 8)) & CH_MASK) as i16;
        }
        let flags = buf[23];
        Some(Self {
            channels,
            ch17: flags & CH17_MASK != 0,
            ch18: flags & CH18_MASK != 0,
            lost_frame: flags & LOST_FRAME_MASK != 0,
            failsafe: flags & FAILSAFE_MASK != 0,
        })
    }

    /// Build the raw frame (footer `0x00`); channel values are truncated to 11 bits.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = HEADER;
        for (i, &ch) in self.channels.iter().enumerate() {
            let bit = i * CH_BITS;
            let at = 1 + bit / 8;
            let v = (ch as u32 & CH_MASK) << (bit % 8);
            buf[at] |= v as u8;
            buf[at + 1] |= (v >> 8) as u8;
            buf[at + 2] |= (v >> 16) as u8;
        }
        let mut flags = 0;
        if self.ch17 {
            flags |= CH17_MASK;
        }
        if self.ch18 {
            flags |= CH18_MASK;
        }
        if self.lost_frame {
            flags |= LOST_FRAME_MASK;
        }
        if self.failsafe {
            flags |= FAILSAFE_MASK;
        }
        buf[23] = flags;
        buf[24] = FOOTER;
        buf
    }
}

impl Packed<PACKED_LEN> for SbusFrame {
    fn to_bytes(&self) -> [u8; PACKED_LEN] {
        let mut out = [0u8; PACKED_LEN];
        for (chunk, ch) in out.chunks_exact_mut(2).zip(self.channels) {
            chunk.copy_from_slice(&ch.to_le_bytes());
        }
        let flags = &mut out[NUM_CH * 2..];
        flags[0] = u8::from(self.failsafe);
        flags[1] = u8::from(self.lost_frame);
        flags[2] = u8::from(self.ch17);
        flags[3] = u8::from(self.ch18);
        out
    }

    fn from_bytes(bytes: [u8; PACKED_LEN]) -> Self {
        let mut channels = [0i16; NUM_CH];
        for (ch, chunk) in channels.iter_mut().zip(bytes.chunks_exact(2)) {
            *ch = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        let flags = &bytes[NUM_CH * 2..];
        Self {
            channels,
            failsafe: flags[0] != 0,
            lost_frame: flags[1] != 0,
            ch17: flags[2] != 0,
            ch18: flags[3] != 0,
        }
    }
}

/// Incremental decoder over a byte transport.
pub struct SbusRx<T> {
    transport: T,
    state: usize,
    prev_byte: u8,
    buf: [u8; FRAME_LEN],
    frame: SbusFrame,
    frames: u64,
}

impl<T: Transport> SbusRx<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: 0,
            prev_byte: FOOTER,
            buf: [0; FRAME_LEN],
            frame: SbusFrame::default(),
            frames: 0,
        }
    }

    /// Drop any half-collected frame; the last decoded values are kept.
    pub fn begin(&mut self) {
        self.state = 0;
        self.prev_byte = FOOTER;
    }

    /// Drain everything buffered. `true` if at least one complete frame decoded.
    pub fn read(&mut self) -> io::Result<bool> {
        let mut new_data = false;
        while let Some(byte) = self.transport.read_byte()? {
            if self.push(byte) {
                new_data = true;
            }
        }
        Ok(new_data)
    }

    fn push(&mut self, byte: u8) -> bool {
        let mut decoded = false;
        if self.state == 0 {
            if byte == HEADER && is_footer(self.prev_byte) {
                self.buf[0] = byte;
                self.state = 1;
            }
        } else {
            self.buf[self.state] = byte;
            self.state += 1;
            if self.state == FRAME_LEN {
                self.state = 0;
                if let Some(frame) = SbusFrame::decode(&self.buf) {
                    self.frame = frame;
                    self.frames += 1;
                    decoded = true;
                }
            }
        }
        self.prev_byte = byte;
        decoded
    }

    pub fn frame(&self) -> SbusFrame {
        self.frame
    }

    pub fn ch(&self, index: usize) -> Option<i16> {
        self.frame.channels.get(index).copied()
    }

    pub fn channels(&self) -> [i16; NUM_CH] {
        self.frame.channels
    }

    pub fn failsafe(&self) -> bool {
        self.frame.failsafe
    }

    pub fn lost_frame(&self) -> bool {
        self.frame.lost_frame
    }

    pub fn ch17(&self) -> bool {
        self.frame.ch17
    }

    pub fn ch18(&self) -> bool {
        self.frame.ch18
    }

    /// Frames decoded since construction.
    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
