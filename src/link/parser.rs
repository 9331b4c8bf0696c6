//! Receive-side frame state machine.
//!
//! ```text
//!   Header(0) -> Header(1) -> Header(2) -> Header(3) --+
//!      (skipped when header == 0)                      |
//!                                                      v
//!                                                   Payload
//!                                                      |
//!   Terminator(0) -> ... -> Terminator(3) <------------+
//!      (skipped when terminator == 0)                  |
//!                                                      v
//!                                                    Done
//! ```
//!
//! Each [`FrameParser::step`] consumes what the current state needs: one
//! delimiter byte, or the whole payload in a single bulk read. Any mismatch
//! or short read moves to `Failed`; there is no resynchronisation, the next
//! attempt starts over from a fresh parser.

use super::error::{Delimiter, LinkError};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for header byte `i` (low byte first).
    Header(u8),
    /// Waiting for the payload bulk read.
    Payload,
    /// Waiting for terminator byte `i` (low byte first).
    Terminator(u8),
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct FrameParser {
    header: u32,
    terminator: u32,
    state: RxState,
}

impl FrameParser {
    pub fn new(header: u32, terminator: u32) -> Self {
        let state = if header != 0 {
            RxState::Header(0)
        } else {
            RxState::Payload
        };
        Self {
            header,
            terminator,
            state,
        }
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, RxState::Done | RxState::Failed)
    }

    /// Advance by one transition. `payload` is the receive scratch area, sized
    /// to exactly the attached byte total.
    ///
    /// Call only once the transport reports data; a `read_byte` that comes back
    /// empty is treated as "not yet" and leaves the state as it was.
    pub fn step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &mut [u8],
    ) -> Result<RxState, LinkError> {
        let next = match self.state {
            RxState::Header(i) => {
                let Some(got) = self.read_byte(transport)? else {
                    return Ok(self.state);
                };
                self.match_byte(Delimiter::Header, self.header, i, got)?;
                if i == 3 {
                    RxState::Payload
                } else {
                    RxState::Header(i + 1)
                }
            }
            RxState::Payload => {
                let got = match transport.read_bulk(payload) {
                    Ok(n) => n,
                    Err(e) => return Err(self.fail(e.into())),
                };
                if got != payload.len() {
                    return Err(self.fail(LinkError::ShortRead {
                        expected: payload.len(),
                        got,
                    }));
                }
                if self.terminator != 0 {
                    RxState::Terminator(0)
                } else {
                    RxState::Done
                }
            }
            RxState::Terminator(i) => {
                let Some(got) = self.read_byte(transport)? else {
                    return Ok(self.state);
                };
                self.match_byte(Delimiter::Terminator, self.terminator, i, got)?;
                if i == 3 {
                    RxState::Done
                } else {
                    RxState::Terminator(i + 1)
                }
            }
            RxState::Done | RxState::Failed => self.state,
        };
        self.state = next;
        Ok(next)
    }

    fn read_byte<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<u8>, LinkError> {
        transport.read_byte().map_err(|e| self.fail(e.into()))
    }

    fn match_byte(
        &mut self,
        delimiter: Delimiter,
        value: u32,
        index: u8,
        got: u8,
    ) -> Result<(), LinkError> {
        let expected = value.to_le_bytes()[index as usize];
        if got == expected {
            Ok(())
        } else {
            Err(self.fail(LinkError::FramingMismatch {
                delimiter,
                index,
                expected,
                got,
            }))
        }
    }

    fn fail(&mut self, err: LinkError) -> LinkError {
        self.state = RxState::Failed;
        err
    }
}
