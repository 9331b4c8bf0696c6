//! # Boardlink - Host Link for an Embedded Controller Board
//!
//! Boardlink frames a fixed set of binary objects between a controller board
//! and its host over a byte stream (USB serial in practice). Each side
//! attaches the objects it sends and receives once; every cycle one framed
//! message goes out and at most one comes in.
//!
//! ## Features
//!
//! - **Fixed-layout framing**: optional 4-byte header and terminator around a payload built from up to four attached objects, no allocation after construction.
//! - **Strict receive**: frames are accepted only when both delimiters match and the payload arrived within the timeout; receive objects are never partially written.
//! - **Peripherals**: MCP492X SPI DAC driver on `embedded-hal` traits and an SBUS radio receiver decoder.
//! - **Control loop**: a gain model driven by host commands, with receiver data echoed back every cycle.
//! - **Transports**: serial port via `serialport`, plus an in-memory transport for tests and simulation.
//!
//! ## Quick Start
//!
//! ```rust
//! use boardlink::control::{ControlModel, ExtInputs, ExtOutputs};
//! use boardlink::controller::{Controller, Objects};
//! use boardlink::link::{Link, Packed};
//! use boardlink::transport::MemoryTransport;
//!
//! let objects = Objects::new();
//! let link = Link::new(MemoryTransport::new(), 0, 0);
//! let mut controller: Controller<'_, MemoryTransport> =
//!     Controller::new(link, &objects, ControlModel::default(), None).unwrap();
//!
//! let command = ExtInputs { input1: 1.5, input2: 3.0 };
//! controller.link_mut().transport_mut().unwrap().feed(&command.to_bytes());
//! controller.cycle();
//!
//! let reply = controller.link_mut().transport_mut().unwrap().take_written();
//! let out = ExtOutputs::from_bytes(reply.try_into().unwrap());
//! assert_eq!(out.output1, 3.0);
//! ```
//!
//! ## Module Organization
//!
//! - [`link`] - frame assembly, parsing and the [`link::Link`] itself
//! - [`transport`] - byte stream abstraction and its implementations
//! - [`devices`] - DAC and SBUS peripherals
//! - [`control`] - the control law and its host-facing structs
//! - [`controller`] - one board main-loop iteration
//! - [`config`] - configuration loading and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Controller    │ ← Main loop: model, receiver, metrics, logging
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │      Link       │ ← Framing over attached objects
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Transport     │ ← Serial port or in-memory stream
//! └─────────────────┘
//! ```
//!
//! See `src/main.rs` for the CLI that wires these together.

pub mod config;
pub mod control;
pub mod controller;
pub mod devices;
pub mod link;
pub mod logutil;
pub mod metrics;
pub mod transport;
