//! Status snapshot and its projection from status-page replies.
//!
//! The pump publishes its operating state as numbered read-only status
//! registers. Each page's reply payload is projected field-by-field into one
//! shared [`StatusSnapshot`]; the last written value of a field is
//! authoritative and no history is kept.
//!
//! ## Page Layouts
//!
//! All multi-byte integers little-endian.
//!
//! | Page | Size | Fields (offset: meaning)                                            |
//! |------|------|---------------------------------------------------------------------|
//! | 1    | 20   | 0: compressor runtime min u32, 4: total runtime min u32, 8/12/16: compressor / additional / hot-water energy u32 × 0.01 kWh |
//! | 2    | 8    | 0: hour, 1: minute, 2: second, 3: day, 4: month, 5: year u16, 7: daylight-saving flag |
//! | 3    | 16   | eight i16 × 0.1 °C: outdoor, room, flow, return, hot water, brine in, brine out, exhaust air |
//! | 4    | 8    | 0: compressor activity, 1: defrost flag, 2: frequency u16 × 0.1 Hz, 4: heating duty %, 5: hot-water duty %, 6: input power u16 W |
//! | 5    | 6    | 0: fan speed, 1: fan duty %, 2: filter change u16 days, 4: filter alarm flag, 5: reserved |
//! | 6    | 8    | 0: setting i16 × 0.1 °C, 2: calculated setting i16 × 0.1 °C, 4: extra hot water flag, 5: priority, 6: production flag, 7: reserved |
//! | 7    | 8    | 0: room setting i16 × 0.1 °C, 2: heating-in-progress flag, 3: mode, 4: additional power flag, 5: LED luminosity, 6: reserved |
//! | 8    | 4    | 0: alarm flags u16, 2: last alarm code, 3: reserved                  |
//!
//! A bad field inside a well-formed page is a field-level fault: every other
//! field of the page is still applied, the offending one keeps its previous
//! value, and the first fault is returned for the caller to log.

use serde::Serialize;

use crate::error::DecodeError;
use crate::registers::RegisterName;

// ============================================================================
// Status Pages
// ============================================================================

/// The status pages this implementation models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGroup {
    /// Runtime counters and energy meters.
    Runtime,
    /// Pump-local wall clock.
    Clock,
    /// Sensor temperatures.
    Temperatures,
    /// Compressor state.
    Compressor,
    /// Ventilation state.
    Fan,
    /// Hot water production state.
    HotWater,
    /// Room heating state.
    Heating,
    /// Alarm state.
    Alarms,
}

impl StatusGroup {
    /// Exact payload length of this page's reply.
    pub const fn payload_len(self) -> usize {
        match self {
            StatusGroup::Runtime => 20,
            StatusGroup::Clock => 8,
            StatusGroup::Temperatures => 16,
            StatusGroup::Compressor => 8,
            StatusGroup::Fan => 6,
            StatusGroup::HotWater => 8,
            StatusGroup::Heating => 8,
            StatusGroup::Alarms => 4,
        }
    }
}

// ============================================================================
// Enumerated Values
// ============================================================================

/// Compressor activity reported in status page 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompressorActivity {
    /// Compressor is off.
    #[default]
    Stopped,
    /// Compressor is ramping up.
    Starting,
    /// Compressor is running.
    Running,
    /// Compressor is ramping down.
    Stopping,
}

impl CompressorActivity {
    /// Map a raw status byte to an activity, if known.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(CompressorActivity::Stopped),
            1 => Some(CompressorActivity::Starting),
            2 => Some(CompressorActivity::Running),
            3 => Some(CompressorActivity::Stopping),
            _ => None,
        }
    }
}

/// What the pump is currently serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HeatPumpMode {
    /// Nothing demanded.
    #[default]
    Idle,
    /// Room heating.
    Heating,
    /// Sanitary hot water production.
    HotWater,
    /// Defrost cycle.
    Defrost,
}

impl HeatPumpMode {
    /// Map a raw status byte to a mode, if known.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(HeatPumpMode::Idle),
            1 => Some(HeatPumpMode::Heating),
            2 => Some(HeatPumpMode::HotWater),
            3 => Some(HeatPumpMode::Defrost),
            _ => None,
        }
    }
}

/// Ventilation fan speed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FanSpeed {
    /// Reduced ventilation.
    Low,
    /// Everyday ventilation.
    #[default]
    Normal,
    /// Boosted ventilation.
    Fast,
}

impl FanSpeed {
    /// Map the wire encoding (1–3) to a speed, if known.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(FanSpeed::Low),
            2 => Some(FanSpeed::Normal),
            3 => Some(FanSpeed::Fast),
            _ => None,
        }
    }

    /// The wire encoding of this speed.
    pub fn as_raw(self) -> u8 {
        match self {
            FanSpeed::Low => 1,
            FanSpeed::Normal => 2,
            FanSpeed::Fast => 3,
        }
    }
}

/// Sanitary hot water priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Priority {
    /// Heating wins over hot water.
    Low,
    /// Balanced.
    #[default]
    Normal,
    /// Hot water wins over heating.
    High,
}

impl Priority {
    /// Map the wire encoding (1–3) to a priority, if known.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Priority::Low),
            2 => Some(Priority::Normal),
            3 => Some(Priority::High),
            _ => None,
        }
    }

    /// The wire encoding of this priority.
    pub fn as_raw(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Normal => 2,
            Priority::High => 3,
        }
    }
}

/// Panel display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Language {
    /// English.
    #[default]
    English,
    /// Swedish.
    Swedish,
    /// French.
    French,
    /// German.
    German,
    /// Finnish.
    Finnish,
    /// Norwegian.
    Norwegian,
}

impl Language {
    /// Map the wire encoding to a language, if known.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Language::English),
            1 => Some(Language::Swedish),
            2 => Some(Language::French),
            3 => Some(Language::German),
            4 => Some(Language::Finnish),
            5 => Some(Language::Norwegian),
            _ => None,
        }
    }

    /// The wire encoding of this language.
    pub fn as_raw(self) -> u8 {
        match self {
            Language::English => 0,
            Language::Swedish => 1,
            Language::French => 2,
            Language::German => 3,
            Language::Finnish => 4,
            Language::Norwegian => 5,
        }
    }
}

/// Alarm bits reported in status page 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AlarmFlags(pub u16);

/// Filter change overdue.
pub const ALARM_FILTER: u16 = 1 << 0;
/// Refrigerant low pressure cut-out.
pub const ALARM_LOW_PRESSURE: u16 = 1 << 1;
/// Refrigerant high pressure cut-out.
pub const ALARM_HIGH_PRESSURE: u16 = 1 << 2;
/// A temperature sensor reads open or shorted.
pub const ALARM_SENSOR_FAULT: u16 = 1 << 3;
/// Heating circuit flow too low.
pub const ALARM_FLOW: u16 = 1 << 4;
/// Superheat out of bounds.
pub const ALARM_SUPERHEAT: u16 = 1 << 5;

impl AlarmFlags {
    /// Whether any alarm bit is set.
    pub fn any(self) -> bool {
        self.0 != 0
    }

    /// Filter change overdue.
    pub fn filter(self) -> bool {
        self.0 & ALARM_FILTER != 0
    }

    /// Low pressure cut-out tripped.
    pub fn low_pressure(self) -> bool {
        self.0 & ALARM_LOW_PRESSURE != 0
    }

    /// High pressure cut-out tripped.
    pub fn high_pressure(self) -> bool {
        self.0 & ALARM_HIGH_PRESSURE != 0
    }

    /// Sensor fault detected.
    pub fn sensor_fault(self) -> bool {
        self.0 & ALARM_SENSOR_FAULT != 0
    }

    /// Flow alarm tripped.
    pub fn flow(self) -> bool {
        self.0 & ALARM_FLOW != 0
    }

    /// Superheat alarm tripped.
    pub fn superheat(self) -> bool {
        self.0 & ALARM_SUPERHEAT != 0
    }
}

// ============================================================================
// Status Snapshot
// ============================================================================

/// The pump's last reported operating state, one field per status datum.
///
/// Raw scaled integers are stored as received (`_x10` = tenths, `_x100` =
/// hundredths); accessor methods convert to engineering units.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    // Runtime counters and energy meters (page 1).
    /// Compressor runtime in minutes.
    pub compressor_runtime_min: u32,
    /// Total unit runtime in minutes.
    pub total_runtime_min: u32,
    /// Compressor energy, 0.01 kWh steps.
    pub compressor_energy_x100: u32,
    /// Additional (electric) heater energy, 0.01 kWh steps.
    pub additional_energy_x100: u32,
    /// Hot water energy, 0.01 kWh steps.
    pub hot_water_energy_x100: u32,

    // Pump-local wall clock (page 2).
    /// Clock hour (0–23).
    pub hour: u8,
    /// Clock minute (0–59).
    pub minute: u8,
    /// Clock second (0–59).
    pub second: u8,
    /// Calendar day (1–31).
    pub day: u8,
    /// Calendar month (1–12).
    pub month: u8,
    /// Calendar year.
    pub year: u16,
    /// Automatic daylight saving enabled.
    pub daylight_saving: bool,

    // Sensor temperatures, 0.1 °C steps (page 3).
    /// Outdoor air.
    pub outdoor_temp_x10: i16,
    /// Room air.
    pub room_temp_x10: i16,
    /// Heating circuit flow line.
    pub flow_temp_x10: i16,
    /// Heating circuit return line.
    pub return_temp_x10: i16,
    /// Hot water tank.
    pub hot_water_temp_x10: i16,
    /// Brine circuit inlet.
    pub brine_in_temp_x10: i16,
    /// Brine circuit outlet.
    pub brine_out_temp_x10: i16,
    /// Exhaust air.
    pub exhaust_air_temp_x10: i16,

    // Compressor (page 4).
    /// Current compressor activity.
    pub compressor_activity: CompressorActivity,
    /// Defrost cycle active.
    pub defrost_enabled: bool,
    /// Compressor frequency, 0.1 Hz steps.
    pub compressor_frequency_x10: u16,
    /// Share of capacity spent on heating.
    pub heating_duty_percent: u8,
    /// Share of capacity spent on hot water.
    pub hot_water_duty_percent: u8,
    /// Electrical input power in watts.
    pub input_power_w: u16,

    // Ventilation (page 5).
    /// Current fan speed step.
    pub fan_speed: FanSpeed,
    /// Fan duty cycle.
    pub fan_duty_percent: u8,
    /// Days until the next filter change.
    pub filter_change_days: u16,
    /// Filter change overdue.
    pub filter_alarm: bool,

    // Hot water (page 6).
    /// Configured tank setpoint, 0.1 °C steps.
    pub hot_water_setting_x10: i16,
    /// Setpoint after internal compensation, 0.1 °C steps.
    pub hot_water_calculated_x10: i16,
    /// Extra hot water boost active.
    pub extra_hot_water: bool,
    /// Sanitary priority setting.
    pub hot_water_priority: Priority,
    /// Tank is currently being heated.
    pub hot_water_production: bool,

    // Room heating (page 7).
    /// Configured room setpoint, 0.1 °C steps.
    pub room_setting_x10: i16,
    /// Room heating currently active.
    pub room_heating_in_progress: bool,
    /// What the pump is serving.
    pub mode: HeatPumpMode,
    /// Additional (electric) heater engaged.
    pub additional_power_enabled: bool,
    /// Panel LED brightness (0–6).
    pub led_luminosity: u8,

    // Alarms (page 8).
    /// Active alarm bits.
    pub alarm_flags: AlarmFlags,
    /// Code of the most recent alarm.
    pub last_alarm_code: u8,
}

impl StatusSnapshot {
    /// Outdoor air temperature in °C.
    pub fn outdoor_temp_c(&self) -> f32 {
        self.outdoor_temp_x10 as f32 / 10.0
    }

    /// Room air temperature in °C.
    pub fn room_temp_c(&self) -> f32 {
        self.room_temp_x10 as f32 / 10.0
    }

    /// Flow line temperature in °C.
    pub fn flow_temp_c(&self) -> f32 {
        self.flow_temp_x10 as f32 / 10.0
    }

    /// Return line temperature in °C.
    pub fn return_temp_c(&self) -> f32 {
        self.return_temp_x10 as f32 / 10.0
    }

    /// Hot water tank temperature in °C.
    pub fn hot_water_temp_c(&self) -> f32 {
        self.hot_water_temp_x10 as f32 / 10.0
    }

    /// Exhaust air temperature in °C.
    pub fn exhaust_air_temp_c(&self) -> f32 {
        self.exhaust_air_temp_x10 as f32 / 10.0
    }

    /// Compressor frequency in Hz.
    pub fn compressor_frequency_hz(&self) -> f32 {
        self.compressor_frequency_x10 as f32 / 10.0
    }

    /// Hot water setpoint in °C.
    pub fn hot_water_setting_c(&self) -> f32 {
        self.hot_water_setting_x10 as f32 / 10.0
    }

    /// Room setpoint in °C.
    pub fn room_setting_c(&self) -> f32 {
        self.room_setting_x10 as f32 / 10.0
    }

    /// Compressor energy in kWh.
    pub fn compressor_energy_kwh(&self) -> f64 {
        self.compressor_energy_x100 as f64 / 100.0
    }

    /// Additional heater energy in kWh.
    pub fn additional_energy_kwh(&self) -> f64 {
        self.additional_energy_x100 as f64 / 100.0
    }

    /// Hot water energy in kWh.
    pub fn hot_water_energy_kwh(&self) -> f64 {
        self.hot_water_energy_x100 as f64 / 100.0
    }
}

// ============================================================================
// Projection
// ============================================================================

fn le_u16(payload: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([payload[offset], payload[offset + 1]])
}

fn le_i16(payload: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([payload[offset], payload[offset + 1]])
}

fn le_u32(payload: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ])
}

/// Remember the first fault of a page; later faults of the same page are
/// subsumed by it.
fn record(fault: &mut Option<DecodeError>, err: DecodeError) {
    if fault.is_none() {
        *fault = Some(err);
    }
}

fn flag(
    register: RegisterName,
    field: &'static str,
    raw: u8,
    fault: &mut Option<DecodeError>,
) -> Option<bool> {
    match raw {
        0 => Some(false),
        1 => Some(true),
        _ => {
            record(
                fault,
                DecodeError::UnknownEncoding {
                    register,
                    field,
                    value: raw as u16,
                },
            );
            None
        }
    }
}

fn percent(
    register: RegisterName,
    field: &'static str,
    raw: u8,
    fault: &mut Option<DecodeError>,
) -> Option<u8> {
    if raw <= 100 {
        Some(raw)
    } else {
        record(
            fault,
            DecodeError::UnknownEncoding {
                register,
                field,
                value: raw as u16,
            },
        );
        None
    }
}

/// Project one status page reply into the snapshot.
///
/// The payload length must match the page exactly; otherwise nothing is
/// applied. Within a well-formed page, each field is applied independently
/// and the first field fault (if any) is returned after the rest of the page
/// has been projected.
pub fn apply_status(
    register: RegisterName,
    group: StatusGroup,
    payload: &[u8],
    snap: &mut StatusSnapshot,
) -> Result<(), DecodeError> {
    let expected = group.payload_len();
    if payload.len() != expected {
        return Err(DecodeError::PayloadLength {
            register,
            expected,
            actual: payload.len(),
        });
    }

    let mut fault = None;

    match group {
        StatusGroup::Runtime => {
            snap.compressor_runtime_min = le_u32(payload, 0);
            snap.total_runtime_min = le_u32(payload, 4);
            snap.compressor_energy_x100 = le_u32(payload, 8);
            snap.additional_energy_x100 = le_u32(payload, 12);
            snap.hot_water_energy_x100 = le_u32(payload, 16);
        }

        StatusGroup::Clock => {
            if payload[0] < 24 {
                snap.hour = payload[0];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "hour",
                        value: payload[0] as u16,
                    },
                );
            }
            if payload[1] < 60 {
                snap.minute = payload[1];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "minute",
                        value: payload[1] as u16,
                    },
                );
            }
            if payload[2] < 60 {
                snap.second = payload[2];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "second",
                        value: payload[2] as u16,
                    },
                );
            }
            if (1..=31).contains(&payload[3]) {
                snap.day = payload[3];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "day",
                        value: payload[3] as u16,
                    },
                );
            }
            if (1..=12).contains(&payload[4]) {
                snap.month = payload[4];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "month",
                        value: payload[4] as u16,
                    },
                );
            }
            snap.year = le_u16(payload, 5);
            if let Some(v) = flag(register, "daylight_saving", payload[7], &mut fault) {
                snap.daylight_saving = v;
            }
        }

        StatusGroup::Temperatures => {
            snap.outdoor_temp_x10 = le_i16(payload, 0);
            snap.room_temp_x10 = le_i16(payload, 2);
            snap.flow_temp_x10 = le_i16(payload, 4);
            snap.return_temp_x10 = le_i16(payload, 6);
            snap.hot_water_temp_x10 = le_i16(payload, 8);
            snap.brine_in_temp_x10 = le_i16(payload, 10);
            snap.brine_out_temp_x10 = le_i16(payload, 12);
            snap.exhaust_air_temp_x10 = le_i16(payload, 14);
        }

        StatusGroup::Compressor => {
            match CompressorActivity::from_raw(payload[0]) {
                Some(a) => snap.compressor_activity = a,
                None => record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "activity",
                        value: payload[0] as u16,
                    },
                ),
            }
            if let Some(v) = flag(register, "defrost", payload[1], &mut fault) {
                snap.defrost_enabled = v;
            }
            snap.compressor_frequency_x10 = le_u16(payload, 2);
            if let Some(v) = percent(register, "heating_duty", payload[4], &mut fault) {
                snap.heating_duty_percent = v;
            }
            if let Some(v) = percent(register, "hot_water_duty", payload[5], &mut fault) {
                snap.hot_water_duty_percent = v;
            }
            snap.input_power_w = le_u16(payload, 6);
        }

        StatusGroup::Fan => {
            match FanSpeed::from_raw(payload[0]) {
                Some(s) => snap.fan_speed = s,
                None => record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "fan_speed",
                        value: payload[0] as u16,
                    },
                ),
            }
            if let Some(v) = percent(register, "fan_duty", payload[1], &mut fault) {
                snap.fan_duty_percent = v;
            }
            snap.filter_change_days = le_u16(payload, 2);
            if let Some(v) = flag(register, "filter_alarm", payload[4], &mut fault) {
                snap.filter_alarm = v;
            }
        }

        StatusGroup::HotWater => {
            snap.hot_water_setting_x10 = le_i16(payload, 0);
            snap.hot_water_calculated_x10 = le_i16(payload, 2);
            if let Some(v) = flag(register, "extra_hot_water", payload[4], &mut fault) {
                snap.extra_hot_water = v;
            }
            match Priority::from_raw(payload[5]) {
                Some(p) => snap.hot_water_priority = p,
                None => record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "priority",
                        value: payload[5] as u16,
                    },
                ),
            }
            if let Some(v) = flag(register, "production", payload[6], &mut fault) {
                snap.hot_water_production = v;
            }
        }

        StatusGroup::Heating => {
            snap.room_setting_x10 = le_i16(payload, 0);
            if let Some(v) = flag(register, "in_progress", payload[2], &mut fault) {
                snap.room_heating_in_progress = v;
            }
            match HeatPumpMode::from_raw(payload[3]) {
                Some(m) => snap.mode = m,
                None => record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "mode",
                        value: payload[3] as u16,
                    },
                ),
            }
            if let Some(v) = flag(register, "additional_power", payload[4], &mut fault) {
                snap.additional_power_enabled = v;
            }
            if payload[5] <= 6 {
                snap.led_luminosity = payload[5];
            } else {
                record(
                    &mut fault,
                    DecodeError::UnknownEncoding {
                        register,
                        field: "led_luminosity",
                        value: payload[5] as u16,
                    },
                );
            }
        }

        StatusGroup::Alarms => {
            snap.alarm_flags = AlarmFlags(le_u16(payload, 0));
            snap.last_alarm_code = payload[2];
        }
    }

    match fault {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
