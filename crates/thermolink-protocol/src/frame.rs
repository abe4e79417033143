//! Frame assembly and classification.
//!
//! The heat pump shares its RS-485 service bus with the control panel and
//! whatever else the installer wired in, so the byte stream seen by the
//! controller is a mix of its own echoes, foreign traffic, and line noise.
//! This module carves frames out of that stream incrementally.
//!
//! ## Frame Format
//!
//! | Field       | Size (bytes) | Description                                        |
//! |-------------|--------------|----------------------------------------------------|
//! | destination | 4            | Bus address of the receiver.                       |
//! | source      | 4            | Bus address of the sender.                         |
//! | length      | 1            | Total frame length, header and CRC included.       |
//! | op          | 1            | `R`/`W` query read/write, `r`/`w` reply read/write.|
//! | register id | 9            | Opaque register identifier, exact-match.           |
//! | payload     | 0..108       | Register-specific payload.                         |
//! | crc         | 1            | CRC-8/MAXIM-DOW over everything before it.         |
//!
//! A [`Frame`] is only materialized once the trailing checksum validates;
//! corrupted byte runs never become frames, they become
//! [`ProcessedFrame::Corrupted`] and the assembler resynchronizes by
//! discarding the minimum prefix needed to regain alignment.

use std::fmt;

use log::debug;

use crate::buffer::IncomingBuffer;
use crate::constants::*;
use crate::crc8::crc8;
use crate::error::EncodeError;
use crate::registers::RegisterId;

// ============================================================================
// Frame Model
// ============================================================================

/// A 4-byte bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAddress(pub [u8; ADDR_LEN]);

impl BusAddress {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Direction/op discriminator carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOp {
    /// Read request directed at a register.
    QueryRead,
    /// Write request directed at a register.
    QueryWrite,
    /// Reply carrying a register's value.
    ReplyRead,
    /// Reply confirming a register write.
    ReplyWrite,
}

impl FrameOp {
    /// Map a wire discriminator byte to an op, if known.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            OP_QUERY_READ => Some(FrameOp::QueryRead),
            OP_QUERY_WRITE => Some(FrameOp::QueryWrite),
            OP_REPLY_READ => Some(FrameOp::ReplyRead),
            OP_REPLY_WRITE => Some(FrameOp::ReplyWrite),
            _ => None,
        }
    }

    /// The wire discriminator byte for this op.
    pub fn to_wire(self) -> u8 {
        match self {
            FrameOp::QueryRead => OP_QUERY_READ,
            FrameOp::QueryWrite => OP_QUERY_WRITE,
            FrameOp::ReplyRead => OP_REPLY_READ,
            FrameOp::ReplyWrite => OP_REPLY_WRITE,
        }
    }

    /// Whether this op is a query (command observed on the bus).
    pub fn is_query(self) -> bool {
        matches!(self, FrameOp::QueryRead | FrameOp::QueryWrite)
    }

    /// Whether this op is a reply from the pump.
    pub fn is_reply(self) -> bool {
        !self.is_query()
    }

    /// Whether this op writes a register.
    pub fn is_write(self) -> bool {
        matches!(self, FrameOp::QueryWrite | FrameOp::ReplyWrite)
    }
}

impl fmt::Display for FrameOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrameOp::QueryRead => "query read",
            FrameOp::QueryWrite => "query write",
            FrameOp::ReplyRead => "reply read",
            FrameOp::ReplyWrite => "reply write",
        };
        f.write_str(s)
    }
}

/// Who originated a frame, relative to this controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A query we put on the bus ourselves, seen back as an echo.
    OutgoingQuery,
    /// A query from another device sharing the bus.
    IncomingQuery,
    /// A reply from the heat pump.
    Reply,
}

/// One complete, checksum-validated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Receiver's bus address.
    pub dest: BusAddress,
    /// Sender's bus address.
    pub source: BusAddress,
    /// Direction/op discriminator.
    pub op: FrameOp,
    /// Register this frame addresses.
    pub register_id: RegisterId,
    /// Register-specific payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Classify this frame relative to the given controller address.
    pub fn direction(&self, controller: BusAddress) -> Direction {
        if self.op.is_reply() {
            Direction::Reply
        } else if self.source == controller {
            Direction::OutgoingQuery
        } else {
            Direction::IncomingQuery
        }
    }

    /// Serialize the frame, stamping length and checksum.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let len = MIN_FRAME_LEN + self.payload.len();
        if len > MAX_FRAME_LEN {
            return Err(EncodeError::FrameTooLong {
                len,
                max: MAX_FRAME_LEN,
            });
        }

        let mut buf = Vec::with_capacity(len);
        buf.extend_from_slice(&self.dest.0);
        buf.extend_from_slice(&self.source.0);
        buf.push(len as u8);
        buf.push(self.op.to_wire());
        buf.extend_from_slice(self.register_id.as_bytes());
        buf.extend_from_slice(&self.payload);
        buf.push(crc8(&buf));
        Ok(buf)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Outcome of one assembler scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedFrame {
    /// Not enough bytes buffered for a complete frame.
    None,
    /// Framing or checksum fault; the buffer resynchronized.
    Corrupted,
    /// A command observed on the bus, addressed at the pump.
    Query(Frame),
    /// A reply from the pump.
    Reply(Frame),
    /// Checksum-valid bytes with a direction discriminator this
    /// implementation does not know. Inert.
    Unknown,
}

/// Whether a completed frame's bytes leave the buffer when `poll` returns.
///
/// `Retain` keeps the frame at the front of the buffer so a host correlating
/// a just-sent command with its raw reply can inspect it before releasing it
/// with [`FrameAssembler::consume_processed`]. Each `poll` call states its
/// mode explicitly; there is no sticky flag to forget to reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeMode {
    /// Remove the frame's bytes from the buffer.
    Consume,
    /// Leave the frame buffered until `consume_processed` is called.
    Retain,
}

// ============================================================================
// Grab Buffer
// ============================================================================

/// Diagnostic copy of the bytes behind the last classification.
#[derive(Debug)]
struct GrabBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl GrabBuffer {
    fn new(capacity: usize) -> Self {
        GrabBuffer {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, bytes: &[u8]) {
        self.data.clear();
        let n = bytes.len().min(self.capacity);
        self.data.extend_from_slice(&bytes[..n]);
    }
}

// ============================================================================
// Frame Assembler
// ============================================================================

/// Incremental frame assembler over the incoming byte stream.
///
/// Feed it whatever the transport produced, then `poll` once per processing
/// step. Each poll performs a single synchronous scan: it either classifies
/// one frame, resynchronizes past garbage, or reports that more input is
/// needed. There is no timeout inside the assembler; pacing belongs to the
/// caller.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: IncomingBuffer,
    grab: Option<GrabBuffer>,
    /// Length of a frame returned under `Retain`, awaiting release.
    pending: Option<usize>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an assembler with the protocol's standard buffer capacity.
    pub fn new() -> Self {
        FrameAssembler {
            buf: IncomingBuffer::with_capacity(INCOMING_CAPACITY),
            grab: None,
            pending: None,
        }
    }

    /// Append received bytes. Returns how many were accepted; the remainder
    /// did not fit and is the caller's to retry after the next poll.
    pub fn feed(&mut self, data: &[u8]) -> usize {
        self.buf.extend(data)
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Enable or disable the grab buffer. `Some(capacity)` copies up to
    /// `capacity` raw bytes of every non-`None` classification; `None`
    /// disables grabbing entirely.
    pub fn set_grab_capacity(&mut self, capacity: Option<usize>) {
        self.grab = capacity.map(GrabBuffer::new);
    }

    /// The raw bytes behind the most recent non-`None` classification,
    /// truncated to the grab capacity. `None` when grabbing is disabled or
    /// nothing was classified yet.
    pub fn last_grabbed(&self) -> Option<&[u8]> {
        self.grab.as_ref().map(|g| g.data.as_slice())
    }

    /// Release a frame previously returned under [`ConsumeMode::Retain`].
    pub fn consume_processed(&mut self) {
        if let Some(n) = self.pending.take() {
            self.buf.consume(n);
        }
    }

    /// Discard all buffered bytes and any retained frame.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.pending = None;
    }

    /// Scan the buffer for one complete frame and classify it.
    pub fn poll(&mut self, mode: ConsumeMode) -> ProcessedFrame {
        if self.buf.len() < HEADER_LEN {
            return ProcessedFrame::None;
        }

        let declared = self.buf.as_slice()[LEN_OFFSET] as usize;
        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&declared) {
            // The header cannot be telling the truth. Drop a single byte so
            // a frame boundary hiding one byte further in is still found.
            debug!("implausible declared frame length {declared}, resyncing");
            self.record_grab(1);
            self.buf.consume(1);
            self.pending = None;
            return ProcessedFrame::Corrupted;
        }

        if self.buf.len() < declared {
            return ProcessedFrame::None;
        }

        let bytes = &self.buf.as_slice()[..declared];
        if crc8(&bytes[..declared - 1]) != bytes[declared - 1] {
            // Consume the whole believed frame so the same garbage is not
            // rescanned, then classification continues at the next byte.
            debug!("checksum mismatch, discarding {declared}-byte frame");
            self.record_grab(declared);
            self.buf.consume(declared);
            self.pending = None;
            return ProcessedFrame::Corrupted;
        }

        let result = self.classify(declared);
        self.record_grab(declared);
        match mode {
            ConsumeMode::Consume => {
                self.buf.consume(declared);
                self.pending = None;
            }
            ConsumeMode::Retain => {
                self.pending = Some(declared);
            }
        }
        result
    }

    /// Materialize and classify a checksum-valid frame of `len` bytes.
    fn classify(&self, len: usize) -> ProcessedFrame {
        let bytes = &self.buf.as_slice()[..len];

        let op = match FrameOp::from_wire(bytes[OP_OFFSET]) {
            Some(op) => op,
            None => {
                debug!("unknown direction discriminator 0x{:02X}", bytes[OP_OFFSET]);
                return ProcessedFrame::Unknown;
            }
        };

        let mut dest = [0u8; ADDR_LEN];
        dest.copy_from_slice(&bytes[DEST_OFFSET..DEST_OFFSET + ADDR_LEN]);
        let mut source = [0u8; ADDR_LEN];
        source.copy_from_slice(&bytes[SOURCE_OFFSET..SOURCE_OFFSET + ADDR_LEN]);
        let mut register_id = [0u8; REGISTER_ID_LEN];
        register_id.copy_from_slice(&bytes[REGISTER_OFFSET..REGISTER_OFFSET + REGISTER_ID_LEN]);

        let frame = Frame {
            dest: BusAddress(dest),
            source: BusAddress(source),
            op,
            register_id: RegisterId(register_id),
            payload: bytes[PAYLOAD_OFFSET..len - 1].to_vec(),
        };

        if op.is_query() {
            ProcessedFrame::Query(frame)
        } else {
            ProcessedFrame::Reply(frame)
        }
    }

    fn record_grab(&mut self, len: usize) {
        if let Some(grab) = self.grab.as_mut() {
            grab.record(&self.buf.as_slice()[..len]);
        }
    }
}
