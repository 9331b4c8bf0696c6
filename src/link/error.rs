//! Failure taxonomy for the host link.
//!
//! Every variant is local and non-fatal: the caller drops the cycle and tries
//! again on the next one. The boolean `send()`/`receive()` surface collapses
//! all of these to `false`; the `try_*` variants hand them back intact.

use std::fmt;

/// Which delimiter was being matched when a byte mismatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Header,
    Terminator,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Header => write!(f, "header"),
            Delimiter::Terminator => write!(f, "terminator"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("all {max} slots are already attached")]
    SlotsExhausted { max: usize },

    #[error("attaching {requested} bytes to {attached} would exceed the {limit}-byte payload limit")]
    CapacityExceeded {
        attached: usize,
        requested: usize,
        limit: usize,
    },

    #[error("no transport bound")]
    Unbound,

    #[error("no objects attached in this direction")]
    NothingAttached,

    #[error("no bytes available")]
    NoData,

    #[error("{delimiter} byte {index} mismatch: expected 0x{expected:02X}, got 0x{got:02X}")]
    FramingMismatch {
        delimiter: Delimiter,
        index: u8,
        expected: u8,
        got: u8,
    },

    #[error("short payload read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("frame not completed within {timeout_us} us (elapsed {elapsed_us} us)")]
    Timeout { timeout_us: u64, elapsed_us: u64 },

    #[error("frame of {len} bytes does not fit the {capacity}-byte scratch buffer")]
    FrameOverflow { len: usize, capacity: usize },

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Short stable name, used as a metrics/log key.
    pub fn label(&self) -> &'static str {
        match self {
            LinkError::SlotsExhausted { .. } | LinkError::CapacityExceeded { .. } => "capacity",
            LinkError::Unbound | LinkError::NothingAttached | LinkError::NoData => "not_ready",
            LinkError::FramingMismatch { .. } => "framing",
            LinkError::ShortRead { .. } => "short_read",
            LinkError::Timeout { .. } => "timeout",
            LinkError::FrameOverflow { .. } => "overflow",
            LinkError::Io(_) => "io",
        }
    }

    /// True for the "nothing to do yet" conditions a caller just skips.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            LinkError::Unbound | LinkError::NothingAttached | LinkError::NoData
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_groups_idle_causes() {
        assert!(LinkError::NoData.is_not_ready());
        assert!(LinkError::Unbound.is_not_ready());
        assert!(LinkError::NothingAttached.is_not_ready());
        assert!(!LinkError::ShortRead { expected: 4, got: 1 }.is_not_ready());
        assert_eq!(LinkError::NoData.label(), "not_ready");
    }

    #[test]
    fn mismatch_message_names_delimiter_and_bytes() {
        let err = LinkError::FramingMismatch {
            delimiter: Delimiter::Terminator,
            index: 2,
            expected: 0x22,
            got: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "terminator byte 2 mismatch: expected 0x22, got 0x00"
        );
    }
}
