//! Register table.
//!
//! Every addressable value on the pump is a register identified by a 9-byte
//! key. The table below maps each known key to a descriptor bundling its
//! symbolic name, a display string, the codec kind that interprets its
//! payloads, and which direction/op combinations it supports. Lookup is an
//! exact match over all nine bytes; the bus carries traffic for registers
//! this table does not model, and those propagate as unknown, not as faults.

use std::fmt;

use crate::constants::REGISTER_ID_LEN;
use crate::status::StatusGroup;

// ============================================================================
// Identifiers
// ============================================================================

/// A 9-byte register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterId(pub [u8; REGISTER_ID_LEN]);

impl RegisterId {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; REGISTER_ID_LEN] {
        &self.0
    }
}

/// Symbolic names for the registers this implementation models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RegisterName {
    FanSpeed,
    RoomTemperatureSetting,
    HotWaterTemperatureSetting,
    HotWaterPriority,
    LedLuminosity,
    ClockTime,
    ClockDate,
    ExtraHotWater,
    AutomaticDaylightSaving,
    FireplaceDelay,
    Language,
    AlarmReset,
    CompressorFrequency,
    HotWaterDuty,
    ExhaustFanDuty,
    PanelDisplayTemperature,
    SensorOffset0,
    SensorOffset1,
    SensorOffset2,
    SensorOffset3,
    SensorOffset4,
    SensorOffset5,
    SensorOffset6,
    SensorOffset7,
    Unknown0281,
    Unknown0377,
    Status01,
    Status02,
    Status03,
    Status04,
    Status05,
    Status06,
    Status07,
    Status08,
}

impl RegisterName {
    /// The sensor-offset register for sensor `n` (0–7).
    pub fn sensor_offset(n: usize) -> Option<RegisterName> {
        match n {
            0 => Some(RegisterName::SensorOffset0),
            1 => Some(RegisterName::SensorOffset1),
            2 => Some(RegisterName::SensorOffset2),
            3 => Some(RegisterName::SensorOffset3),
            4 => Some(RegisterName::SensorOffset4),
            5 => Some(RegisterName::SensorOffset5),
            6 => Some(RegisterName::SensorOffset6),
            7 => Some(RegisterName::SensorOffset7),
            _ => None,
        }
    }

    /// The table entry for this name.
    pub fn descriptor(self) -> &'static RegisterDescriptor {
        REGISTERS
            .iter()
            .find(|d| d.name == self)
            .unwrap_or_else(|| unreachable!("register table covers every name"))
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().display)
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Which direction/op combinations a register supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Read request may target this register.
    pub query_read: bool,
    /// Write request may target this register.
    pub query_write: bool,
    /// The pump replies with this register's value.
    pub reply_read: bool,
    /// The pump confirms writes to this register.
    pub reply_write: bool,
}

impl Access {
    /// Readable and writable setting.
    pub const READ_WRITE: Access = Access {
        query_read: true,
        query_write: true,
        reply_read: true,
        reply_write: true,
    };

    /// Read-only value (status pages, measured values).
    pub const READ_ONLY: Access = Access {
        query_read: true,
        query_write: false,
        reply_read: true,
        reply_write: false,
    };

    /// Write-only trigger.
    pub const WRITE_ONLY: Access = Access {
        query_read: false,
        query_write: true,
        reply_read: false,
        reply_write: true,
    };

    /// Whether the given direction/op combination is supported.
    pub fn allows(&self, op: crate::frame::FrameOp) -> bool {
        use crate::frame::FrameOp;
        match op {
            FrameOp::QueryRead => self.query_read,
            FrameOp::QueryWrite => self.query_write,
            FrameOp::ReplyRead => self.reply_read,
            FrameOp::ReplyWrite => self.reply_write,
        }
    }
}

/// Codec selector: how a register's payload bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterKind {
    /// Signed 16-bit, 0.1 °C steps, legal setter range attached.
    Temperature {
        /// Lowest encodable setting.
        min_c: f32,
        /// Highest encodable setting.
        max_c: f32,
    },
    /// Single byte, whole degrees.
    TemperatureByte,
    /// Unsigned 16-bit, 0.1 Hz steps.
    Frequency,
    /// Single byte, 0–100.
    Percentage,
    /// Two bytes: hour, minute.
    TimeOfDay,
    /// Three bytes: day, month, year offset from 2000.
    Date,
    /// Two bytes, 0 = off / 1 = on.
    Switch,
    /// Two bytes, sanitary priority 1–3.
    SanitaryPriority,
    /// Two bytes, day countdown.
    DayDelay {
        /// Highest encodable delay.
        max_days: u8,
    },
    /// Two bytes, fan speed step 1–3.
    FanSpeed,
    /// Two bytes, panel language.
    Language,
    /// Single byte, small integer with an attached bound.
    Digit {
        /// Highest encodable value.
        max: u8,
    },
    /// Fixed magic payload; acknowledges the active alarm.
    ClearAlarm,
    /// Unsigned 16-bit, no scaling. Fallback for unmodeled registers.
    Generic,
    /// Reply-only status page projected into the snapshot.
    Status(StatusGroup),
}

impl RegisterKind {
    /// Exact payload length this kind's codec expects.
    pub fn payload_len(&self) -> usize {
        match self {
            RegisterKind::Temperature { .. } => 2,
            RegisterKind::TemperatureByte => 1,
            RegisterKind::Frequency => 2,
            RegisterKind::Percentage => 1,
            RegisterKind::TimeOfDay => 2,
            RegisterKind::Date => 3,
            RegisterKind::Switch => 2,
            RegisterKind::SanitaryPriority => 2,
            RegisterKind::DayDelay { .. } => 2,
            RegisterKind::FanSpeed => 2,
            RegisterKind::Language => 2,
            RegisterKind::Digit { .. } => 1,
            RegisterKind::ClearAlarm => 2,
            RegisterKind::Generic => 2,
            RegisterKind::Status(group) => group.payload_len(),
        }
    }
}

/// Static description of one known register.
#[derive(Debug)]
pub struct RegisterDescriptor {
    /// Wire identifier.
    pub id: RegisterId,
    /// Symbolic name.
    pub name: RegisterName,
    /// Human-readable name for logs and tools.
    pub display: &'static str,
    /// Codec selector.
    pub kind: RegisterKind,
    /// Supported direction/op combinations.
    pub access: Access,
}

// ============================================================================
// Table
// ============================================================================

/// All registers this implementation models.
pub static REGISTERS: &[RegisterDescriptor] = &[
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x07, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
        name: RegisterName::FanSpeed,
        display: "fan speed",
        kind: RegisterKind::FanSpeed,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x04, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00]),
        name: RegisterName::RoomTemperatureSetting,
        display: "room temperature setting",
        kind: RegisterKind::Temperature {
            min_c: 10.0,
            max_c: 50.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x04, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00]),
        name: RegisterName::HotWaterTemperatureSetting,
        display: "hot water temperature setting",
        kind: RegisterKind::Temperature {
            min_c: 10.0,
            max_c: 60.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x04, 0x00, 0x00, 0x00, 0x00, 0x0B, 0x00]),
        name: RegisterName::HotWaterPriority,
        display: "hot water priority",
        kind: RegisterKind::SanitaryPriority,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x09, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00]),
        name: RegisterName::LedLuminosity,
        display: "led luminosity",
        kind: RegisterKind::Digit { max: 6 },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
        name: RegisterName::ClockTime,
        display: "clock time",
        kind: RegisterKind::TimeOfDay,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00]),
        name: RegisterName::ClockDate,
        display: "clock date",
        kind: RegisterKind::Date,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x04, 0x00, 0x00, 0x00, 0x00, 0xF9, 0x00]),
        name: RegisterName::ExtraHotWater,
        display: "extra hot water",
        kind: RegisterKind::Switch,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00]),
        name: RegisterName::AutomaticDaylightSaving,
        display: "automatic daylight saving",
        kind: RegisterKind::Switch,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x02, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00]),
        name: RegisterName::FireplaceDelay,
        display: "fireplace delay",
        kind: RegisterKind::DayDelay { max_days: 3 },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x09, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
        name: RegisterName::Language,
        display: "panel language",
        kind: RegisterKind::Language,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
        name: RegisterName::AlarmReset,
        display: "alarm reset",
        kind: RegisterKind::ClearAlarm,
        access: Access::WRITE_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00]),
        name: RegisterName::CompressorFrequency,
        display: "compressor frequency",
        kind: RegisterKind::Frequency,
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x01, 0x00, 0x00, 0x00, 0x00, 0x06, 0x00]),
        name: RegisterName::HotWaterDuty,
        display: "hot water duty",
        kind: RegisterKind::Percentage,
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x07, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00]),
        name: RegisterName::ExhaustFanDuty,
        display: "exhaust fan duty",
        kind: RegisterKind::Percentage,
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x09, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00]),
        name: RegisterName::PanelDisplayTemperature,
        display: "panel display temperature",
        kind: RegisterKind::TemperatureByte,
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00]),
        name: RegisterName::SensorOffset0,
        display: "sensor offset 0",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x11, 0x00]),
        name: RegisterName::SensorOffset1,
        display: "sensor offset 1",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x12, 0x00]),
        name: RegisterName::SensorOffset2,
        display: "sensor offset 2",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x13, 0x00]),
        name: RegisterName::SensorOffset3,
        display: "sensor offset 3",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00]),
        name: RegisterName::SensorOffset4,
        display: "sensor offset 4",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x15, 0x00]),
        name: RegisterName::SensorOffset5,
        display: "sensor offset 5",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x16, 0x00]),
        name: RegisterName::SensorOffset6,
        display: "sensor offset 6",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x05, 0x00, 0x00, 0x00, 0x00, 0x17, 0x00]),
        name: RegisterName::SensorOffset7,
        display: "sensor offset 7",
        kind: RegisterKind::Temperature {
            min_c: -10.0,
            max_c: 10.0,
        },
        access: Access::READ_WRITE,
    },
    // Seen on the bus during every panel boot; meaning not yet modeled.
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x02, 0x00, 0x00, 0x00, 0x00, 0x81, 0x00]),
        name: RegisterName::Unknown0281,
        display: "unknown 02/81",
        kind: RegisterKind::Generic,
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x03, 0x00, 0x00, 0x00, 0x00, 0x77, 0x00]),
        name: RegisterName::Unknown0377,
        display: "unknown 03/77",
        kind: RegisterKind::Generic,
        access: Access::READ_WRITE,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
        name: RegisterName::Status01,
        display: "status 01",
        kind: RegisterKind::Status(StatusGroup::Runtime),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00]),
        name: RegisterName::Status02,
        display: "status 02",
        kind: RegisterKind::Status(StatusGroup::Clock),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00]),
        name: RegisterName::Status03,
        display: "status 03",
        kind: RegisterKind::Status(StatusGroup::Temperatures),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00]),
        name: RegisterName::Status04,
        display: "status 04",
        kind: RegisterKind::Status(StatusGroup::Compressor),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00]),
        name: RegisterName::Status05,
        display: "status 05",
        kind: RegisterKind::Status(StatusGroup::Fan),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x06, 0x00]),
        name: RegisterName::Status06,
        display: "status 06",
        kind: RegisterKind::Status(StatusGroup::HotWater),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x07, 0x00]),
        name: RegisterName::Status07,
        display: "status 07",
        kind: RegisterKind::Status(StatusGroup::Heating),
        access: Access::READ_ONLY,
    },
    RegisterDescriptor {
        id: RegisterId([0x41, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00]),
        name: RegisterName::Status08,
        display: "status 08",
        kind: RegisterKind::Status(StatusGroup::Alarms),
        access: Access::READ_ONLY,
    },
];

/// Look up a register by exact identifier match.
pub fn find_register(id: &RegisterId) -> Option<&'static RegisterDescriptor> {
    REGISTERS.iter().find(|d| &d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in REGISTERS.iter().enumerate() {
            for b in &REGISTERS[i + 1..] {
                assert_ne!(a.id, b.id, "{} and {} share an id", a.display, b.display);
            }
        }
    }

    #[test]
    fn test_every_name_has_one_entry() {
        for desc in REGISTERS {
            let count = REGISTERS.iter().filter(|d| d.name == desc.name).count();
            assert_eq!(count, 1, "{} appears {} times", desc.display, count);
        }
    }

    #[test]
    fn test_lookup_is_exact_match_not_prefix() {
        let fan = RegisterName::FanSpeed.descriptor();
        assert_eq!(find_register(&fan.id).unwrap().name, RegisterName::FanSpeed);

        // Same first eight bytes, different ninth: no match.
        let mut near_miss = fan.id.0;
        near_miss[8] ^= 0xFF;
        assert!(find_register(&RegisterId(near_miss)).is_none());
    }

    #[test]
    fn test_sensor_offset_mapping() {
        assert_eq!(
            RegisterName::sensor_offset(0),
            Some(RegisterName::SensorOffset0)
        );
        assert_eq!(
            RegisterName::sensor_offset(7),
            Some(RegisterName::SensorOffset7)
        );
        assert_eq!(RegisterName::sensor_offset(8), None);
    }

    #[test]
    fn test_status_pages_are_not_writable() {
        use crate::frame::FrameOp;
        for desc in REGISTERS {
            if let RegisterKind::Status(_) = desc.kind {
                assert!(
                    !desc.access.allows(FrameOp::QueryWrite),
                    "{} must not accept writes",
                    desc.display
                );
            }
        }
    }
}
