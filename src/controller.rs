//! # Control Loop
//!
//! Stitches the host link, the control law and the SBUS receiver together.
//! One [`Controller::cycle`] is one iteration of the board's main loop:
//!
//! 1. drain the SBUS receiver and publish the newest frame
//! 2. try to receive a host frame (model inputs)
//! 3. on success, run the control law and publish the outputs
//! 4. send the current outputs (and SBUS frame) to the host
//!
//! A send happens every cycle whether or not a command arrived, so the host
//! sees the last outputs and fresh receiver data at the loop rate.
//!
//! Frame layout, host to board: `[ExtInputs]`.
//! Board to host: `[ExtOutputs]` or `[ExtOutputs][SbusFrame]` with a receiver.

use log::{debug, trace, warn};

use crate::control::{ControlModel, ExtInputs, IO_LEN};
use crate::devices::sbus::{self, SbusFrame, SbusRx};
use crate::link::{Clock, Link, LinkError, MonotonicClock, Region};
use crate::logutil::hex_snippet;
use crate::metrics;
use crate::transport::{MemoryTransport, Transport};

/// Storage for every object the controller exchanges with the host.
///
/// Created before the controller and borrowed by its link for the whole run.
#[derive(Debug, Default)]
pub struct Objects {
    pub inputs: Region<IO_LEN>,
    pub outputs: Region<IO_LEN>,
    pub sbus: Region<{ sbus::PACKED_LEN }>,
}

impl Objects {
    pub fn new() -> Self {
        let objects = Self::default();
        objects.sbus.store(&SbusFrame::default());
        objects
    }
}

/// What happened during one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub sbus_updated: bool,
    pub received: bool,
    pub sent: bool,
}

pub struct Controller<'a, T, S = MemoryTransport, C = MonotonicClock> {
    link: Link<'a, T, C>,
    objects: &'a Objects,
    model: ControlModel,
    sbus: Option<SbusRx<S>>,
}

impl<'a, T: Transport, S: Transport, C: Clock> Controller<'a, T, S, C> {
    /// Attach `objects` to `link`, start the model and reset the receiver decoder.
    pub fn new(
        mut link: Link<'a, T, C>,
        objects: &'a Objects,
        mut model: ControlModel,
        mut sbus: Option<SbusRx<S>>,
    ) -> Result<Self, LinkError> {
        link.try_attach_rx(objects.inputs.cells())?;
        link.try_attach_tx(objects.outputs.cells())?;
        if sbus.is_some() {
            link.try_attach_tx(objects.sbus.cells())?;
        }
        model.begin();
        if let Some(rx) = sbus.as_mut() {
            rx.begin();
        }
        debug!(
            "Controller ready: rx {} bytes in {} slot(s), tx {} bytes in {} slot(s)",
            link.rx_bytes(),
            link.rx_slots(),
            link.tx_bytes(),
            link.tx_slots()
        );
        Ok(Self {
            link,
            objects,
            model,
            sbus,
        })
    }

    pub fn cycle(&mut self) -> CycleReport {
        metrics::inc_cycles();
        let mut report = CycleReport::default();

        if let Some(rx) = self.sbus.as_mut() {
            match rx.read() {
                Ok(true) => {
                    let frame = rx.frame();
                    self.objects.sbus.store(&frame);
                    metrics::inc_sbus_frames();
                    report.sbus_updated = true;
                    if frame.failsafe {
                        debug!("SBUS receiver in failsafe");
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("SBUS read error: {}", e),
            }
        }

        match self.link.try_receive() {
            Ok(()) => {
                metrics::inc_frames_received();
                let inputs: ExtInputs = self.objects.inputs.load();
                self.model.set_inputs(inputs);
                self.model.update();
                self.objects.outputs.store(&self.model.outputs());
                report.received = true;
                trace!(
                    "Inputs {:?} -> outputs {:?}",
                    inputs,
                    self.model.outputs()
                );
            }
            Err(e) => {
                metrics::record_rx_failure(&e);
                log_rx_failure(&e);
            }
        }

        match self.link.try_send() {
            Ok(len) => {
                metrics::inc_frames_sent();
                report.sent = true;
                trace!("Sent {} byte frame", len);
            }
            Err(e) => {
                metrics::inc_send_failures();
                match e {
                    LinkError::Io(_) => warn!("Host link send failed: {}", e),
                    _ => debug!("Host link send skipped: {}", e),
                }
            }
        }

        report
    }

    /// Stop the model; the link and transports are dropped with the controller.
    pub fn shutdown(&mut self) {
        self.model.stop();
    }

    pub fn link(&self) -> &Link<'a, T, C> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut Link<'a, T, C> {
        &mut self.link
    }

    pub fn model(&self) -> &ControlModel {
        &self.model
    }

    pub fn sbus_mut(&mut self) -> Option<&mut SbusRx<S>> {
        self.sbus.as_mut()
    }
}

fn log_rx_failure(err: &LinkError) {
    match err {
        e if e.is_not_ready() => trace!("Host link idle: {}", e),
        LinkError::Io(_) => warn!("Host link receive failed: {}", err),
        _ => debug!("Host frame rejected: {}", err),
    }
}

/// Debug view of a raw frame, for tools that tap the byte stream.
pub fn describe_frame(bytes: &[u8]) -> String {
    format!("{} bytes [{}]", bytes.len(), hex_snippet(bytes, 48))
}
