//! Heat-Pump Service Bus Protocol
//!
//! This crate implements the wire protocol spoken on the RS-485 service bus
//! of a residential heat pump: incremental frame assembly over a shared,
//! noisy byte stream, CRC validation, and a register-table-driven codec that
//! turns raw payloads into typed values (temperatures, percentages,
//! frequencies, timestamps, flags) and back.
//!
//! # Protocol Overview
//!
//! Traffic on the bus is a sequence of addressed frames:
//!
//! - **Queries** (controller → pump): register read (`R`) or write (`W`)
//!   requests. The bus is multi-drop, so queries from other controllers and
//!   our own echoes are observed too.
//! - **Replies** (pump → controller): register values (`r`) or write
//!   confirmations (`w`), including the periodic status pages projected into
//!   a [`StatusSnapshot`].
//!
//! The crate performs no I/O and never blocks: feed bytes into a
//! [`FrameAssembler`], poll it once per processing step, and hand classified
//! frames to [`interpret`]. Corrupted byte runs are expected steady-state
//! conditions on this bus; they classify as
//! [`ProcessedFrame::Corrupted`] and cost at most the bytes needed to regain
//! frame alignment.
//!
//! # Example
//!
//! ```rust,ignore
//! use thermolink_protocol::{ConsumeMode, FrameAssembler, ProcessedFrame};
//!
//! let mut assembler = FrameAssembler::new();
//! assembler.feed(&received);
//! match assembler.poll(ConsumeMode::Consume) {
//!     ProcessedFrame::Reply(frame) => { /* look up register, interpret */ }
//!     ProcessedFrame::Corrupted => { /* resynchronized, keep going */ }
//!     _ => {}
//! }
//! ```

pub mod buffer;
pub mod codec;
pub mod constants;
pub mod crc8;
pub mod error;
pub mod frame;
pub mod registers;
pub mod status;

pub use buffer::IncomingBuffer;
pub use codec::{decode_payload, encode_payload, interpret, FrameMeaning, RegisterValue};
pub use crc8::crc8;
pub use error::{DecodeError, EncodeError};
pub use frame::{
    BusAddress, ConsumeMode, Direction, Frame, FrameAssembler, FrameOp, ProcessedFrame,
};
pub use registers::{
    find_register, Access, RegisterDescriptor, RegisterId, RegisterKind, RegisterName, REGISTERS,
};
pub use status::{
    apply_status, AlarmFlags, CompressorActivity, FanSpeed, HeatPumpMode, Language, Priority,
    StatusGroup, StatusSnapshot,
};
