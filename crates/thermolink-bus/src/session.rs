//! Bus session: the single processing loop and the confirmed setters.
//!
//! A [`HeatPumpSession`] owns the frame assembler, the status snapshot, and
//! the bus addresses. The host drives it with one [`process`] call per
//! scheduling tick; everything inside a call runs to completion and nothing
//! blocks waiting for bus traffic. Setters compose a write query, put it on
//! the wire, and drive `process` themselves until the pump's write
//! confirmation arrives or a wall-clock deadline passes.
//!
//! [`process`]: HeatPumpSession::process

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

use thermolink_protocol::constants::{DEFAULT_CONTROLLER_ADDR, DEFAULT_HEATPUMP_ADDR};
use thermolink_protocol::{
    encode_payload, find_register, interpret, BusAddress, ConsumeMode, EncodeError, FanSpeed,
    Frame, FrameAssembler, FrameOp, Language, Priority, ProcessedFrame, RegisterName,
    RegisterValue, StatusSnapshot,
};

use crate::transport::BusTransport;

/// How often an unconfirmed command is retransmitted.
const RESEND_INTERVAL: Duration = Duration::from_millis(900);
/// Idle pause between processing passes while waiting for a reply.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(2);
/// Read chunk drained from the transport per processing pass.
const READ_CHUNK: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// Classification of the frame handled by one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessedFrameType {
    /// No complete frame was available.
    None,
    /// A corrupted byte run was discarded and the buffer resynchronized.
    Corrupted,
    /// A command addressed at the pump was observed.
    Query,
    /// A reply from the pump was handled.
    Reply,
    /// A frame this implementation cannot interpret was consumed.
    Unknown,
}

/// Errors from the confirmed-setter operations.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The value failed validation before transmission.
    #[error("encode: {0}")]
    Encode(#[from] EncodeError),

    /// The transport failed.
    #[error("transport: {0}")]
    Io(#[from] std::io::Error),

    /// No sensor with this number exists.
    #[error("no sensor {sensor} (sensors are numbered 0-7)")]
    InvalidSensor {
        /// Requested sensor number.
        sensor: usize,
    },

    /// The pump did not confirm the write in time.
    #[error("no confirmation for {register} within {timeout_ms} ms")]
    Timeout {
        /// Register that was being written.
        register: RegisterName,
        /// Deadline that passed.
        timeout_ms: u64,
    },
}

// ============================================================================
// Session
// ============================================================================

/// One controller's connection to the heat-pump service bus.
pub struct HeatPumpSession<T: BusTransport> {
    transport: T,
    assembler: FrameAssembler,
    status: StatusSnapshot,
    heatpump_addr: BusAddress,
    controller_addr: BusAddress,
    /// The most recent materialized frame, kept for command correlation.
    last_frame: Option<Frame>,
}

impl<T: BusTransport> HeatPumpSession<T> {
    /// Create a session over the given transport with factory addresses.
    pub fn new(transport: T) -> Self {
        HeatPumpSession {
            transport,
            assembler: FrameAssembler::new(),
            status: StatusSnapshot::default(),
            heatpump_addr: BusAddress(DEFAULT_HEATPUMP_ADDR),
            controller_addr: BusAddress(DEFAULT_CONTROLLER_ADDR),
            last_frame: None,
        }
    }

    /// Override the pump's bus address.
    pub fn set_heatpump_addr(&mut self, addr: BusAddress) {
        self.heatpump_addr = addr;
    }

    /// Override this controller's bus address.
    pub fn set_controller_addr(&mut self, addr: BusAddress) {
        self.controller_addr = addr;
    }

    /// The pump's last reported state.
    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The most recent materialized frame, if any.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Enable or disable the diagnostic grab buffer.
    pub fn set_grab_capacity(&mut self, capacity: Option<usize>) {
        self.assembler.set_grab_capacity(capacity);
    }

    /// Raw bytes behind the most recent classification, when grabbing is on.
    pub fn last_grabbed(&self) -> Option<&[u8]> {
        self.assembler.last_grabbed()
    }

    /// Release a frame retained by `process(ConsumeMode::Retain)`.
    pub fn consume_processed(&mut self) {
        self.assembler.consume_processed();
    }

    /// Drop all buffered bus bytes.
    pub fn reset(&mut self) {
        self.assembler.reset();
        self.last_frame = None;
    }

    /// Run one processing pass: drain the transport, scan for one frame,
    /// and dispatch it.
    ///
    /// Replies on status registers update the snapshot in place. Queries and
    /// write confirmations are decoded for logging and correlation only.
    /// Waiting — for more bytes, or for a reply — is expressed by returning
    /// [`ProcessedFrameType::None`] and being called again.
    pub fn process(&mut self, mode: ConsumeMode) -> ProcessedFrameType {
        self.drain_transport();

        match self.assembler.poll(mode) {
            ProcessedFrame::None => ProcessedFrameType::None,
            ProcessedFrame::Corrupted => {
                debug!("corrupted frame on bus, resynchronized");
                ProcessedFrameType::Corrupted
            }
            ProcessedFrame::Unknown => {
                debug!("frame with unknown discriminator consumed");
                ProcessedFrameType::Unknown
            }
            ProcessedFrame::Query(frame) => self.dispatch(frame),
            ProcessedFrame::Reply(frame) => self.dispatch(frame),
        }
    }

    fn drain_transport(&mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read_available(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let accepted = self.assembler.feed(&chunk[..n]);
                    if accepted < n {
                        warn!("incoming buffer saturated, dropped {} bytes", n - accepted);
                        break;
                    }
                }
                Err(err) => {
                    warn!("transport read failed: {err}");
                    break;
                }
            }
        }
    }

    /// Decode a materialized frame against the register table.
    fn dispatch(&mut self, frame: Frame) -> ProcessedFrameType {
        let classification = if frame.op.is_query() {
            ProcessedFrameType::Query
        } else {
            ProcessedFrameType::Reply
        };

        let result = match find_register(&frame.register_id) {
            None => {
                // Foreign traffic for a register this table does not model.
                debug!(
                    "unmodeled register {:02X?}, frame ignored",
                    frame.register_id.as_bytes()
                );
                self.last_frame = Some(frame);
                return ProcessedFrameType::Unknown;
            }
            Some(desc) => (desc, interpret(&frame, desc, &mut self.status)),
        };

        match result {
            (desc, Ok(meaning)) => {
                debug!(
                    "{:?} {} {} from {}: {:?}",
                    frame.direction(self.controller_addr),
                    frame.op,
                    desc.display,
                    frame.source,
                    meaning
                );
            }
            (desc, Err(err)) => {
                // Field-level fault: the frame's classification stands, the
                // affected field keeps its previous value.
                warn!("{}: decode fault: {err}", desc.display);
            }
        }

        self.last_frame = Some(frame);
        classification
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Put a read request for a register on the wire.
    ///
    /// The reply arrives through a later `process` call like any other bus
    /// traffic; status-page replies land in the snapshot.
    pub fn request_register(&mut self, register: RegisterName) -> Result<(), CommandError> {
        let desc = register.descriptor();
        let frame = Frame {
            dest: self.heatpump_addr,
            source: self.controller_addr,
            op: FrameOp::QueryRead,
            register_id: desc.id,
            payload: Vec::new(),
        };
        self.transport.write_frame(&frame.encode()?)?;
        Ok(())
    }

    /// Set the ventilation fan speed.
    pub fn set_fan_speed(&mut self, speed: FanSpeed, timeout: Duration) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::FanSpeed,
            RegisterValue::FanSpeed(speed),
            timeout,
        )
    }

    /// Set the room temperature setpoint in °C (10.0–50.0, 0.1° steps).
    pub fn set_room_temperature(
        &mut self,
        temp_c: f32,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::RoomTemperatureSetting,
            RegisterValue::Celsius(temp_c),
            timeout,
        )
    }

    /// Set the hot water setpoint in °C (10.0–60.0, 0.1° steps).
    pub fn set_hot_water_temperature(
        &mut self,
        temp_c: f32,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::HotWaterTemperatureSetting,
            RegisterValue::Celsius(temp_c),
            timeout,
        )
    }

    /// Set the sanitary hot water priority.
    pub fn set_hot_water_priority(
        &mut self,
        priority: Priority,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::HotWaterPriority,
            RegisterValue::Priority(priority),
            timeout,
        )
    }

    /// Set the panel LED brightness (0 = off, 6 = brightest).
    pub fn set_led_luminosity(&mut self, level: u8, timeout: Duration) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::LedLuminosity,
            RegisterValue::Digit(level),
            timeout,
        )
    }

    /// Set the pump's wall-clock time.
    pub fn set_time(&mut self, hour: u8, minute: u8, timeout: Duration) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::ClockTime,
            RegisterValue::TimeOfDay { hour, minute },
            timeout,
        )
    }

    /// Set the pump's calendar date.
    pub fn set_date(
        &mut self,
        day: u8,
        month: u8,
        year: u16,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::ClockDate,
            RegisterValue::Date { day, month, year },
            timeout,
        )
    }

    /// Enable or disable the extra hot water boost.
    pub fn set_extra_hot_water(
        &mut self,
        enable: bool,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::ExtraHotWater,
            RegisterValue::Switch(enable),
            timeout,
        )
    }

    /// Enable or disable automatic daylight-saving adjustment.
    pub fn set_automatic_daylight_saving(
        &mut self,
        enable: bool,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::AutomaticDaylightSaving,
            RegisterValue::Switch(enable),
            timeout,
        )
    }

    /// Enable or disable fireplace mode (a one-day ventilation delay).
    pub fn set_fireplace_mode(
        &mut self,
        enable: bool,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        let days = if enable { 1 } else { 0 };
        self.push_setting(
            RegisterName::FireplaceDelay,
            RegisterValue::DayDelay(days),
            timeout,
        )
    }

    /// Set the panel language.
    pub fn set_language(
        &mut self,
        language: Language,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        self.push_setting(
            RegisterName::Language,
            RegisterValue::Language(language),
            timeout,
        )
    }

    /// Set a sensor's calibration offset in °C (sensor 0–7, ±10.0, 0.1° steps).
    pub fn set_sensor_offset(
        &mut self,
        sensor: usize,
        offset_c: f32,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        let register = RegisterName::sensor_offset(sensor)
            .ok_or(CommandError::InvalidSensor { sensor })?;
        self.push_setting(register, RegisterValue::Celsius(offset_c), timeout)
    }

    /// Acknowledge the active alarm.
    pub fn clear_alarm(&mut self, timeout: Duration) -> Result<(), CommandError> {
        self.push_setting(RegisterName::AlarmReset, RegisterValue::AlarmReset, timeout)
    }

    /// Encode a register write, transmit it, and drive processing until the
    /// pump echoes the write back or the deadline passes.
    ///
    /// The command is retransmitted at a fixed interval while unconfirmed;
    /// unrelated traffic handled along the way (status pages, foreign
    /// queries) is processed normally.
    fn push_setting(
        &mut self,
        register: RegisterName,
        value: RegisterValue,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        let desc = register.descriptor();
        let payload = encode_payload(desc, &value)?;
        let wire = Frame {
            dest: self.heatpump_addr,
            source: self.controller_addr,
            op: FrameOp::QueryWrite,
            register_id: desc.id,
            payload: payload.clone(),
        }
        .encode()?;

        let deadline = Instant::now() + timeout;
        let mut next_send = Instant::now();

        while Instant::now() < deadline {
            if Instant::now() >= next_send {
                self.transport.write_frame(&wire)?;
                next_send = Instant::now() + RESEND_INTERVAL;
            }

            match self.process(ConsumeMode::Consume) {
                ProcessedFrameType::Reply => {
                    if let Some(frame) = &self.last_frame {
                        if frame.op == FrameOp::ReplyWrite
                            && frame.register_id == desc.id
                            && frame.payload == payload
                        {
                            debug!("{} confirmed", desc.display);
                            return Ok(());
                        }
                    }
                }
                ProcessedFrameType::None => thread::sleep(IDLE_POLL_INTERVAL),
                _ => {}
            }
        }

        Err(CommandError::Timeout {
            register,
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}
