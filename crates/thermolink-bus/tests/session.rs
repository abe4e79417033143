//! Integration tests driving a session over a scripted transport.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use thermolink_bus::{BusTransport, CommandError, HeatPumpSession, ProcessedFrameType};
use thermolink_protocol::constants::{DEFAULT_CONTROLLER_ADDR, DEFAULT_HEATPUMP_ADDR, OP_OFFSET};
use thermolink_protocol::{
    crc8, BusAddress, ConsumeMode, Frame, FrameOp, RegisterId, RegisterName,
};

const CONTROLLER: BusAddress = BusAddress(DEFAULT_CONTROLLER_ADDR);
const HEATPUMP: BusAddress = BusAddress(DEFAULT_HEATPUMP_ADDR);

/// A canned transport: bytes queued by the test come back out of
/// `read_available`, written frames are recorded, and (optionally) every
/// written query is answered with the pump's write confirmation.
struct ScriptedTransport {
    incoming: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    auto_confirm: bool,
}

impl ScriptedTransport {
    fn new() -> Self {
        ScriptedTransport {
            incoming: VecDeque::new(),
            written: Vec::new(),
            auto_confirm: false,
        }
    }

    fn confirming() -> Self {
        ScriptedTransport {
            auto_confirm: true,
            ..Self::new()
        }
    }

    fn queue(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes);
    }
}

/// Build the pump's confirmation for a written query: addresses swapped,
/// op lowered to the reply discriminator, checksum restamped.
fn confirmation_for(query: &[u8]) -> Vec<u8> {
    let mut reply = query.to_vec();
    reply[0..4].copy_from_slice(&query[4..8]);
    reply[4..8].copy_from_slice(&query[0..4]);
    reply[OP_OFFSET] += 0x20;
    let crc_pos = reply.len() - 1;
    reply[crc_pos] = crc8(&reply[..crc_pos]);
    reply
}

impl BusTransport for ScriptedTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.incoming.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.incoming.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.push(bytes.to_vec());
        if self.auto_confirm {
            let reply = confirmation_for(bytes);
            self.incoming.extend(reply);
        }
        Ok(())
    }
}

fn reply_frame(register: RegisterName, payload: &[u8]) -> Vec<u8> {
    Frame {
        dest: CONTROLLER,
        source: HEATPUMP,
        op: FrameOp::ReplyRead,
        register_id: register.descriptor().id,
        payload: payload.to_vec(),
    }
    .encode()
    .expect("frame fits")
}

fn temperatures_page() -> Vec<u8> {
    let mut payload = Vec::new();
    for raw in [-52i16, 215, 348, 312, 521, 35, -18, 183] {
        payload.extend_from_slice(&raw.to_le_bytes());
    }
    payload
}

#[test]
fn test_status_reply_updates_snapshot() {
    let mut transport = ScriptedTransport::new();
    transport.queue(&reply_frame(RegisterName::Status03, &temperatures_page()));

    let mut session = HeatPumpSession::new(transport);
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::Reply);
    assert_eq!(session.status().room_temp_c(), 21.5);
    assert_eq!(session.status().outdoor_temp_c(), -5.2);

    // Nothing left to do.
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::None);
}

#[test]
fn test_corrupted_then_valid_in_one_chunk() {
    let mut corrupt = reply_frame(RegisterName::Status03, &temperatures_page());
    let crc_pos = corrupt.len() - 1;
    corrupt[crc_pos] ^= 0x01;
    let valid = reply_frame(RegisterName::Status03, &temperatures_page());

    let mut transport = ScriptedTransport::new();
    transport.queue(&corrupt);
    transport.queue(&valid);

    let mut session = HeatPumpSession::new(transport);
    assert_eq!(
        session.process(ConsumeMode::Consume),
        ProcessedFrameType::Corrupted
    );
    // Misalignment from the corrupted frame must not propagate.
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::Reply);
    assert_eq!(session.status().room_temp_c(), 21.5);
}

#[test]
fn test_unmodeled_register_is_unknown() {
    let wire = Frame {
        dest: CONTROLLER,
        source: HEATPUMP,
        op: FrameOp::ReplyRead,
        register_id: RegisterId([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x00, 0x00]),
        payload: vec![0x01, 0x00],
    }
    .encode()
    .expect("frame fits");

    let mut transport = ScriptedTransport::new();
    transport.queue(&wire);

    let mut session = HeatPumpSession::new(transport);
    assert_eq!(
        session.process(ConsumeMode::Consume),
        ProcessedFrameType::Unknown
    );
    // Consumed without further effect.
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::None);
}

#[test]
fn test_decode_fault_does_not_change_classification() {
    // Raw 150 on a percentage register: decode fault, but the frame itself
    // is a well-formed reply and classifies as one.
    let wire = reply_frame(RegisterName::HotWaterDuty, &[150]);

    let mut transport = ScriptedTransport::new();
    transport.queue(&wire);

    let mut session = HeatPumpSession::new(transport);
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::Reply);
}

#[test]
fn test_set_room_temperature_confirmed() {
    let mut session = HeatPumpSession::new(ScriptedTransport::confirming());
    session
        .set_room_temperature(21.5, Duration::from_secs(1))
        .expect("confirmed write");

    // The confirmation the session correlated on echoes raw 215.
    let frame = session.last_frame().expect("confirmation was processed");
    assert_eq!(frame.op, FrameOp::ReplyWrite);
    assert_eq!(
        frame.register_id,
        RegisterName::RoomTemperatureSetting.descriptor().id
    );
    assert_eq!(frame.payload, vec![0xD7, 0x00]);
}

#[test]
fn test_set_fan_speed_writes_query_frame() {
    use thermolink_protocol::FanSpeed;

    let mut session = HeatPumpSession::new(ScriptedTransport::confirming());
    session
        .set_fan_speed(FanSpeed::Fast, Duration::from_secs(1))
        .expect("confirmed write");

    let frame = session.last_frame().expect("confirmation was processed");
    assert_eq!(frame.op, FrameOp::ReplyWrite);
    assert_eq!(frame.register_id, RegisterName::FanSpeed.descriptor().id);
    assert_eq!(frame.payload, vec![3, 0]);
}

#[test]
fn test_setter_times_out_without_confirmation() {
    let mut session = HeatPumpSession::new(ScriptedTransport::new());
    let err = session
        .set_extra_hot_water(true, Duration::from_millis(50))
        .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Timeout {
            register: RegisterName::ExtraHotWater,
            ..
        }
    ));
}

#[test]
fn test_encode_fault_rejected_before_transmission() {
    let mut session = HeatPumpSession::new(ScriptedTransport::new());
    let err = session
        .set_hot_water_temperature(99.0, Duration::from_secs(1))
        .unwrap_err();

    assert!(matches!(err, CommandError::Encode(_)));
    // Nothing was put on the wire and nothing came back.
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::None);
}

#[test]
fn test_invalid_sensor_number() {
    let mut session = HeatPumpSession::new(ScriptedTransport::new());
    let err = session
        .set_sensor_offset(9, 1.5, Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidSensor { sensor: 9 }));
}

#[test]
fn test_retain_mode_round_trip() {
    let wire = reply_frame(RegisterName::Status03, &temperatures_page());

    let mut transport = ScriptedTransport::new();
    transport.queue(&wire);

    let mut session = HeatPumpSession::new(transport);
    assert_eq!(session.process(ConsumeMode::Retain), ProcessedFrameType::Reply);
    // The frame stays buffered until explicitly released.
    assert_eq!(session.process(ConsumeMode::Retain), ProcessedFrameType::Reply);

    session.consume_processed();
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::None);
}

#[test]
fn test_grab_buffer_through_session() {
    let wire = reply_frame(RegisterName::Status08, &[0x01, 0x00, 3, 0]);

    let mut transport = ScriptedTransport::new();
    transport.queue(&wire);

    let mut session = HeatPumpSession::new(transport);
    session.set_grab_capacity(Some(256));
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::Reply);
    assert_eq!(session.last_grabbed(), Some(wire.as_slice()));
    assert!(session.status().alarm_flags.filter());
}

#[test]
fn test_request_register_puts_read_query_on_wire() {
    let mut session = HeatPumpSession::new(ScriptedTransport::new());
    session
        .request_register(RegisterName::Status03)
        .expect("write succeeds");

    // The query echoes nothing back on a silent bus.
    assert_eq!(session.process(ConsumeMode::Consume), ProcessedFrameType::None);
}

#[test]
fn test_incremental_delivery_matches_batch_delivery() {
    // The same traffic split arbitrarily across processing ticks produces
    // the same classification sequence and the same snapshot.
    let first = reply_frame(RegisterName::Status03, &temperatures_page());
    let second = reply_frame(RegisterName::Status08, &[0x02, 0x00, 5, 0]);

    // Both frames in one chunk.
    let mut batch_transport = ScriptedTransport::new();
    batch_transport.queue(&first);
    batch_transport.queue(&second);
    let mut batch = HeatPumpSession::new(batch_transport);
    let mut batch_classifications = Vec::new();
    loop {
        match batch.process(ConsumeMode::Consume) {
            ProcessedFrameType::None => break,
            c => batch_classifications.push(c),
        }
    }

    // Delivered in fragments, with idle ticks in between. The transport is
    // owned by the session, so fragments are staged through a shared queue.
    struct Staged {
        fragments: VecDeque<Vec<u8>>,
        current: VecDeque<u8>,
    }
    impl BusTransport for Staged {
        fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.current.is_empty() {
                // Stage the next fragment; it becomes visible on the next
                // call, so each processing tick sees at most one fragment.
                if let Some(next) = self.fragments.pop_front() {
                    self.current.extend(next);
                }
                return Ok(0);
            }
            let n = buf.len().min(self.current.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.current.pop_front().unwrap();
            }
            Ok(n)
        }
        fn write_frame(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Ok(())
        }
    }

    let mut wire: Vec<u8> = Vec::new();
    wire.extend_from_slice(&first);
    wire.extend_from_slice(&second);
    // Split at awkward places: mid-header, mid-payload, at the CRC byte.
    let fragments: VecDeque<Vec<u8>> = [&wire[..5], &wire[5..23], &wire[23..35], &wire[35..]]
        .iter()
        .map(|f| f.to_vec())
        .collect();

    let mut incremental = HeatPumpSession::new(Staged {
        fragments,
        current: VecDeque::new(),
    });
    let mut incremental_classifications = Vec::new();
    for _ in 0..16 {
        match incremental.process(ConsumeMode::Consume) {
            ProcessedFrameType::None => {}
            c => incremental_classifications.push(c),
        }
    }

    assert_eq!(
        batch_classifications,
        vec![ProcessedFrameType::Reply, ProcessedFrameType::Reply]
    );
    assert_eq!(batch_classifications, incremental_classifications);
    assert_eq!(
        batch.status().room_temp_c(),
        incremental.status().room_temp_c()
    );
    assert!(incremental.status().alarm_flags.low_pressure());
}
