//! Process-wide link counters.
//! Updated by the controller loop; the link itself stays side-effect free.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::link::LinkError;

static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static FRAMES_RECEIVED: AtomicU64 = AtomicU64::new(0);
static SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
static RX_IDLE: AtomicU64 = AtomicU64::new(0);
static RX_FRAMING: AtomicU64 = AtomicU64::new(0);
static RX_SHORT_READ: AtomicU64 = AtomicU64::new(0);
static RX_TIMEOUT: AtomicU64 = AtomicU64::new(0);
static RX_IO: AtomicU64 = AtomicU64::new(0);
static SBUS_FRAMES: AtomicU64 = AtomicU64::new(0);
static CYCLES: AtomicU64 = AtomicU64::new(0);

pub fn inc_frames_sent() {
    FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_frames_received() {
    FRAMES_RECEIVED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_send_failures() {
    SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_sbus_frames() {
    SBUS_FRAMES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_cycles() {
    CYCLES.fetch_add(1, Ordering::Relaxed);
}

/// Bucket a receive failure by cause.
pub fn record_rx_failure(err: &LinkError) {
    let counter = match err {
        e if e.is_not_ready() => &RX_IDLE,
        LinkError::FramingMismatch { .. } => &RX_FRAMING,
        LinkError::ShortRead { .. } => &RX_SHORT_READ,
        LinkError::Timeout { .. } => &RX_TIMEOUT,
        _ => &RX_IO,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub cycles: u64,
    pub frames_sent: u64,
    pub frames_received: u64,
    pub send_failures: u64,
    pub rx_idle: u64,
    pub rx_framing: u64,
    pub rx_short_read: u64,
    pub rx_timeout: u64,
    pub rx_io: u64,
    pub sbus_frames: u64,
}

impl Snapshot {
    /// Receive attempts that found data but could not complete a frame.
    pub fn rx_rejected(&self) -> u64 {
        self.rx_framing + self.rx_short_read + self.rx_timeout + self.rx_io
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        cycles: CYCLES.load(Ordering::Relaxed),
        frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
        frames_received: FRAMES_RECEIVED.load(Ordering::Relaxed),
        send_failures: SEND_FAILURES.load(Ordering::Relaxed),
        rx_idle: RX_IDLE.load(Ordering::Relaxed),
        rx_framing: RX_FRAMING.load(Ordering::Relaxed),
        rx_short_read: RX_SHORT_READ.load(Ordering::Relaxed),
        rx_timeout: RX_TIMEOUT.load(Ordering::Relaxed),
        rx_io: RX_IO.load(Ordering::Relaxed),
        sbus_frames: SBUS_FRAMES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Delimiter;

    // Counters are global and other tests bump them too, so compare deltas.
    #[test]
    fn rx_failures_land_in_their_bucket() {
        let before = snapshot();
        record_rx_failure(&LinkError::NoData);
        record_rx_failure(&LinkError::FramingMismatch {
            delimiter: Delimiter::Header,
            index: 0,
            expected: 1,
            got: 2,
        });
        record_rx_failure(&LinkError::ShortRead {
            expected: 4,
            got: 0,
        });
        let after = snapshot();
        assert!(after.rx_idle > before.rx_idle);
        assert!(after.rx_framing > before.rx_framing);
        assert!(after.rx_short_read > before.rx_short_read);
        assert!(after.rx_rejected() >= before.rx_rejected() + 2);
    }
}
