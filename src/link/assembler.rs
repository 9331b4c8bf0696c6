//! Transmit side: header, attached objects, terminator, in one buffer.

use super::error::LinkError;
use super::registry::SlotList;

/// Bytes a delimiter occupies on the wire; zero means the delimiter is off.
pub const fn delimiter_len(value: u32) -> usize {
    if value == 0 {
        0
    } else {
        4
    }
}

/// Total on-wire length for a payload of `payload_len` bytes.
pub const fn frame_len(header: u32, terminator: u32, payload_len: usize) -> usize {
    delimiter_len(header) + payload_len + delimiter_len(terminator)
}

/// Lay out one frame in `buf` and return its length.
///
/// Nothing is written if the frame would not fit.
pub fn assemble(
    header: u32,
    terminator: u32,
    slots: &SlotList<'_>,
    buf: &mut [u8],
) -> Result<usize, LinkError> {
    let len = frame_len(header, terminator, slots.total_bytes());
    if len > buf.len() {
        return Err(LinkError::FrameOverflow {
            len,
            capacity: buf.len(),
        });
    }

    let mut at = 0;
    if header != 0 {
        buf[..4].copy_from_slice(&header.to_le_bytes());
        at = 4;
    }
    at += slots.gather(&mut buf[at..]);
    if terminator != 0 {
        buf[at..at + 4].copy_from_slice(&terminator.to_le_bytes());
        at += 4;
    }
    debug_assert_eq!(at, len);
    Ok(len)
}
