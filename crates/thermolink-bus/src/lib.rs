//! Host-Side Heat-Pump Bus Session
//!
//! This crate wraps [`thermolink-protocol`](thermolink_protocol) with the
//! pieces a host application needs: a [`BusTransport`] boundary to whatever
//! carries the bytes, and a [`HeatPumpSession`] that owns the processing
//! loop, the status snapshot, and the "change a setting and wait for the
//! pump's confirmation" command family.
//!
//! The session is strictly single-threaded and reactive: one `process` call
//! per scheduling tick, no internal blocking, no background threads. A
//! multi-threaded host must funnel all calls through one context.

mod session;
mod transport;

pub use session::{CommandError, HeatPumpSession, ProcessedFrameType};
pub use transport::BusTransport;
