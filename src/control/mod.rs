//! Control law executed once per cycle.
//!
//! The law is a pure function of the current [`ExtInputs`] to [`ExtOutputs`]:
//!
//! ```text
//! output1 = gain * input1
//! output2 = input2
//! ```
//!
//! Both structs are exchanged with the host as two little-endian `f32`s.

use serde::{Deserialize, Serialize};

use crate::link::Packed;

pub const DEFAULT_GAIN: f32 = 2.0;

/// Bytes of one packed input or output struct.
pub const IO_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub gain: f32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { gain: DEFAULT_GAIN }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtInputs {
    pub input1: f32,
    pub input2: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtOutputs {
    pub output1: f32,
    pub output2: f32,
}

fn pack_pair(a: f32, b: f32) -> [u8; IO_LEN] {
    let mut out = [0u8; IO_LEN];
    out[..4].copy_from_slice(&a.to_le_bytes());
    out[4..].copy_from_slice(&b.to_le_bytes());
    out
}

fn unpack_pair(bytes: [u8; IO_LEN]) -> (f32, f32) {
    let [a0, a1, a2, a3, b0, b1, b2, b3] = bytes;
    (
        f32::from_le_bytes([a0, a1, a2, a3]),
        f32::from_le_bytes([b0, b1, b2, b3]),
    )
}

impl Packed<IO_LEN> for ExtInputs {
    fn to_bytes(&self) -> [u8; IO_LEN] {
        pack_pair(self.input1, self.input2)
    }

    fn from_bytes(bytes: [u8; IO_LEN]) -> Self {
        let (input1, input2) = unpack_pair(bytes);
        Self { input1, input2 }
    }
}

impl Packed<IO_LEN> for ExtOutputs {
    fn to_bytes(&self) -> [u8; IO_LEN] {
        pack_pair(self.output1, self.output2)
    }

    fn from_bytes(bytes: [u8; IO_LEN]) -> Self {
        let (output1, output2) = unpack_pair(bytes);
        Self { output1, output2 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControlModel {
    params: ModelParams,
    inputs: ExtInputs,
    outputs: ExtOutputs,
}

impl ControlModel {
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Nothing to initialise; kept so callers follow begin/update/stop.
    pub fn begin(&mut self) {}

    pub fn update(&mut self) {
        self.outputs = ExtOutputs {
            output1: self.params.gain * self.inputs.input1,
            output2: self.inputs.input2,
        };
    }

    pub fn stop(&mut self) {}

    pub fn set_inputs(&mut self, inputs: ExtInputs) {
        self.inputs = inputs;
    }

    pub fn inputs(&self) -> ExtInputs {
        self.inputs
    }

    pub fn outputs(&self) -> ExtOutputs {
        self.outputs
    }

    pub fn params(&self) -> ModelParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_applies_to_first_input_only() {
        let mut model = ControlModel::new(ModelParams::default());
        model.begin();
        model.set_inputs(ExtInputs {
            input1: 1.5,
            input2: -3.0,
        });
        model.update();
        assert_eq!(
            model.outputs(),
            ExtOutputs {
                output1: 3.0,
                output2: -3.0
            }
        );
        model.stop();
    }

    #[test]
    fn outputs_hold_until_next_update() {
        let mut model = ControlModel::new(ModelParams { gain: 10.0 });
        model.set_inputs(ExtInputs {
            input1: 1.0,
            input2: 0.0,
        });
        assert_eq!(model.outputs(), ExtOutputs::default());
        model.update();
        assert_eq!(model.outputs().output1, 10.0);
    }

    #[test]
    fn packed_floats_are_little_endian() {
        let bytes = ExtInputs {
            input1: 1.0,
            input2: -2.0,
        }
        .to_bytes();
        assert_eq!(bytes, [0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0]);
        assert_eq!(ExtOutputs::from_bytes(bytes).output2, -2.0);
    }
}
