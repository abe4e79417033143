//! Protocol constants
//!
//! These constants define the wire layout, op discriminators, default bus
//! addresses, and codec scale factors used on the heat-pump service bus.

// ============================================================================
// Wire Layout
// ============================================================================

/// Size of a bus address in bytes.
pub const ADDR_LEN: usize = 4;
/// Size of a register identifier in bytes.
pub const REGISTER_ID_LEN: usize = 9;
/// Size of the frame header: destination + source + length + op + register id.
pub const HEADER_LEN: usize = 19;
/// Smallest legal frame: header plus trailing CRC, empty payload.
pub const MIN_FRAME_LEN: usize = 20;
/// Largest legal frame the protocol produces.
pub const MAX_FRAME_LEN: usize = 128;
/// Capacity of the incoming accumulation buffer.
pub const INCOMING_CAPACITY: usize = 256;

/// Offset of the destination address field.
pub const DEST_OFFSET: usize = 0;
/// Offset of the source address field.
pub const SOURCE_OFFSET: usize = 4;
/// Offset of the total-frame-length byte.
pub const LEN_OFFSET: usize = 8;
/// Offset of the op discriminator byte.
pub const OP_OFFSET: usize = 9;
/// Offset of the register identifier.
pub const REGISTER_OFFSET: usize = 10;
/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = 19;

// ============================================================================
// Op Discriminators
// ============================================================================

/// Register read request (controller → pump).
pub const OP_QUERY_READ: u8 = b'R';
/// Register write request (controller → pump).
pub const OP_QUERY_WRITE: u8 = b'W';
/// Register read reply (pump → controller).
pub const OP_REPLY_READ: u8 = b'r';
/// Register write reply (pump → controller).
pub const OP_REPLY_WRITE: u8 = b'w';

// ============================================================================
// Default Bus Addresses
// ============================================================================

/// Factory address of the heat pump on the service bus.
pub const DEFAULT_HEATPUMP_ADDR: [u8; 4] = [0x65, 0x6F, 0xDE, 0x02];
/// Default address this controller claims. Any value works as long as it is
/// unique on the bus.
pub const DEFAULT_CONTROLLER_ADDR: [u8; 4] = [0x41, 0x64, 0x61, 0x21];

// ============================================================================
// Codec Scale Factors
// ============================================================================

/// Temperatures travel as signed 16-bit values in 0.1 °C steps.
pub const TEMPERATURE_SCALE: f32 = 10.0;
/// Compressor frequency travels as an unsigned 16-bit value in 0.1 Hz steps.
pub const FREQUENCY_SCALE: f32 = 10.0;
/// Energy counters travel in 0.01 kWh steps.
pub const ENERGY_SCALE: f64 = 100.0;
/// Date payloads carry the year as an offset from this base.
pub const DATE_YEAR_BASE: u16 = 2000;
/// Fixed payload acknowledged by the alarm-reset register.
pub const CLEAR_ALARM_MAGIC: [u8; 2] = [0x01, 0x00];
