//! Transport boundary.
//!
//! The session is transport-agnostic: anything that can hand over whatever
//! bytes have arrived and put a frame on the wire works — a serial port, a
//! TCP bridge, a replay file. Electrical concerns (parity, timing, collision
//! avoidance on the half-duplex bus) live behind this trait.

use std::io;

/// A byte-stream connection to the RS-485 service bus.
pub trait BusTransport {
    /// Copy whatever bytes have arrived into `buf` without blocking.
    ///
    /// Returns the number of bytes written to `buf`; zero means nothing is
    /// pending right now, not end-of-stream.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Queue one encoded frame for transmission.
    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()>;
}
