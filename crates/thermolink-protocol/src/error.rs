//! Protocol error types.
//!
//! Framing and checksum faults are not errors: they surface as
//! [`ProcessedFrame::Corrupted`](crate::frame::ProcessedFrame) classifications
//! and the assembler recovers by resynchronizing. The error types here cover
//! the register codec layer: a decode fault is localized to one register's
//! decode attempt, an encode fault is a caller-input error detected before
//! any bytes reach the transport.

use thiserror::Error;

use crate::frame::FrameOp;
use crate::registers::RegisterName;

/// Errors raised while decoding a register payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload length does not match what the register's codec expects.
    #[error("{register}: payload length {actual}, expected {expected}")]
    PayloadLength {
        /// Register being decoded.
        register: RegisterName,
        /// Length the codec expects.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },

    /// Raw value is outside the register's documented range.
    #[error("{register}: raw value {value} out of range")]
    ValueOutOfRange {
        /// Register being decoded.
        register: RegisterName,
        /// Offending raw value.
        value: u16,
    },

    /// A field carries a raw encoding the codec does not know.
    #[error("{register}: field `{field}` has unknown encoding 0x{value:02X}")]
    UnknownEncoding {
        /// Register being decoded.
        register: RegisterName,
        /// Field within the payload.
        field: &'static str,
        /// Offending raw value.
        value: u16,
    },

    /// The register does not support this direction/op combination.
    #[error("{register} does not support {op}")]
    UnsupportedOperation {
        /// Register looked up.
        register: RegisterName,
        /// Direction/op combination attempted.
        op: FrameOp,
    },

    /// The register is a status page and carries no single typed value.
    #[error("{register} is a status page, not a value register")]
    NotAValue {
        /// Register looked up.
        register: RegisterName,
    },
}

/// Errors raised while encoding an outgoing register write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Value is outside the register's documented legal range.
    #[error("{register}: {detail}")]
    OutOfRange {
        /// Register being encoded.
        register: RegisterName,
        /// Description of the violated bound.
        detail: String,
    },

    /// The value variant does not match the register's codec.
    #[error("{register}: value does not match this register's codec")]
    WrongValueType {
        /// Register being encoded.
        register: RegisterName,
    },

    /// The register cannot be written.
    #[error("{register} is not writable")]
    NotWritable {
        /// Register being encoded.
        register: RegisterName,
    },

    /// Frame would exceed the maximum frame length.
    #[error("frame too long: {len} bytes (max {max})")]
    FrameTooLong {
        /// Resulting frame length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
}
