//! # Status Code Classifier
//!
//! Each report is stored with exactly one status code. The code is chosen by
//! walking [`CLASSIFIER_RULES`] in order and taking the first rule whose reason
//! bit is set; a report with no matching bit falls through to
//! [`StatusCode::Notify`]. Three rules look at auxiliary signals to pick
//! between two codes: time-elapsed (ignition and idling), external power
//! (voltage) and geofence (entry bit).

use super::flags::{ReasonFlags, StatusFlags};
use crate::constants::{EXT_POWER_ON_VOLTS, GEOFENCE_ENTERED};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized event codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusCode {
    IgnitionOn = 0xF401,
    IgnitionOff = 0xF403,
    MotionExcessIdle = 0xF118,
    MotionInMotion = 0xF112,
    MotionDormant = 0xF114,
    MotionIdle = 0xF116,
    MotionStart = 0xF111,
    MotionMoving = 0xF11C,
    MotionHeading = 0xF11F,
    MotionExcessSpeed = 0xF11A,
    PanicOn = 0xF841,
    PowerOn = 0xFD19,
    PowerOff = 0xFD17,
    InputState = 0xF400,
    LowBattery = 0xFD10,
    ExcessAccel = 0xF960,
    ExcessBraking = 0xF930,
    ExcessCornering = 0xF937,
    Impact = 0xF941,
    TowingStart = 0xF871,
    GeofenceArrive = 0xF210,
    GeofenceDepart = 0xF230,
    Initialized = 0xF010,
    Heartbeat = 0xF060,
    Query = 0xF040,
    BreachOn = 0xF889,
    Notify = 0xF044,
}

impl StatusCode {
    /// Numeric event code
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Short event name
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::IgnitionOn => "IGN.ON",
            StatusCode::IgnitionOff => "IGN.OFF",
            StatusCode::MotionExcessIdle => "MOT.IDLE.X",
            StatusCode::MotionInMotion => "MOT.INMOTION",
            StatusCode::MotionDormant => "MOT.DORMANT",
            StatusCode::MotionIdle => "MOT.IDLE",
            StatusCode::MotionStart => "MOT.START",
            StatusCode::MotionMoving => "MOT.MOVING",
            StatusCode::MotionHeading => "MOT.HEADING",
            StatusCode::MotionExcessSpeed => "MOT.SPEED.X",
            StatusCode::PanicOn => "PANIC_ON",
            StatusCode::PowerOn => "POWERON",
            StatusCode::PowerOff => "POWEROFF",
            StatusCode::InputState => "INP.STA",
            StatusCode::LowBattery => "BATT.LOW",
            StatusCode::ExcessAccel => "OBD.ACCEL",
            StatusCode::ExcessBraking => "OBD.BRAKE",
            StatusCode::ExcessCornering => "OBD.CORNERING",
            StatusCode::Impact => "OBD.IMPACT",
            StatusCode::TowingStart => "TOW_START",
            StatusCode::GeofenceArrive => "GEO.ARR",
            StatusCode::GeofenceDepart => "GEO.DEP",
            StatusCode::Initialized => "INITIALIZED",
            StatusCode::Heartbeat => "HEARTBEAT",
            StatusCode::Query => "QUERY",
            StatusCode::BreachOn => "BREACH_ON",
            StatusCode::Notify => "NOTIFY",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StatusCode::IgnitionOn => "Ignition_On",
            StatusCode::IgnitionOff => "Ignition_Off",
            StatusCode::MotionExcessIdle => "Excess_Idle",
            StatusCode::MotionInMotion => "InMotion",
            StatusCode::MotionDormant => "Dormant",
            StatusCode::MotionIdle => "Idle",
            StatusCode::MotionStart => "Start",
            StatusCode::MotionMoving => "Moving",
            StatusCode::MotionHeading => "Heading_Change",
            StatusCode::MotionExcessSpeed => "Speeding",
            StatusCode::PanicOn => "Panic",
            StatusCode::PowerOn => "Power_On",
            StatusCode::PowerOff => "Power_Off",
            StatusCode::InputState => "Inputs",
            StatusCode::LowBattery => "Low_Battery",
            StatusCode::ExcessAccel => "Excess_Accel",
            StatusCode::ExcessBraking => "Braking",
            StatusCode::ExcessCornering => "Cornering",
            StatusCode::Impact => "Impact",
            StatusCode::TowingStart => "Tow",
            StatusCode::GeofenceArrive => "Arrive",
            StatusCode::GeofenceDepart => "Depart",
            StatusCode::Initialized => "Initialized",
            StatusCode::Heartbeat => "Heartbeat",
            StatusCode::Query => "Query",
            StatusCode::BreachOn => "Breach",
            StatusCode::Notify => "Notify",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.name())
    }
}

/// Signals a rule may inspect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput {
    pub reason: ReasonFlags,
    pub status: StatusFlags,
    pub ext_power_volts: f64,
    pub geofence: u8,
}

/// Result of a matching rule
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Fixed(StatusCode),
    Branch(fn(&ClassifierInput) -> StatusCode),
}

/// `(reason bit, outcome)` pair; the first rule whose bit is set wins
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRule {
    pub reason: ReasonFlags,
    pub outcome: Outcome,
}

impl ClassifierRule {
    const fn fixed(reason: ReasonFlags, code: StatusCode) -> Self {
        Self {
            reason,
            outcome: Outcome::Fixed(code),
        }
    }

    const fn branch(reason: ReasonFlags, pick: fn(&ClassifierInput) -> StatusCode) -> Self {
        Self {
            reason,
            outcome: Outcome::Branch(pick),
        }
    }

    /// Code produced by this rule, or `None` when its bit is clear.
    pub fn apply(&self, input: &ClassifierInput) -> Option<StatusCode> {
        if !input.reason.intersects(self.reason) {
            return None;
        }
        Some(match self.outcome {
            Outcome::Fixed(code) => code,
            Outcome::Branch(pick) => pick(input),
        })
    }
}

fn time_elapsed(input: &ClassifierInput) -> StatusCode {
    if !input.status.ignition_on() {
        StatusCode::MotionDormant
    } else if input.reason.contains(ReasonFlags::IDLING_ONGOING) {
        StatusCode::MotionExcessIdle
    } else {
        StatusCode::MotionInMotion
    }
}

fn external_power(input: &ClassifierInput) -> StatusCode {
    if input.ext_power_volts > EXT_POWER_ON_VOLTS {
        StatusCode::PowerOn
    } else {
        StatusCode::PowerOff
    }
}

fn geofence(input: &ClassifierInput) -> StatusCode {
    if input.geofence & GEOFENCE_ENTERED != 0 {
        StatusCode::GeofenceArrive
    } else {
        StatusCode::GeofenceDepart
    }
}

/// Classification rules in priority order
pub static CLASSIFIER_RULES: [ClassifierRule; 22] = [
    ClassifierRule::fixed(ReasonFlags::JOURNEY_START, StatusCode::IgnitionOn),
    ClassifierRule::fixed(ReasonFlags::JOURNEY_STOP, StatusCode::IgnitionOff),
    ClassifierRule::branch(ReasonFlags::TIME_ELAPSED, time_elapsed),
    ClassifierRule::fixed(ReasonFlags::IDLING_START, StatusCode::MotionIdle),
    ClassifierRule::fixed(ReasonFlags::IDLING_END, StatusCode::MotionStart),
    ClassifierRule::fixed(ReasonFlags::DIST_TRAVELLED, StatusCode::MotionMoving),
    ClassifierRule::fixed(ReasonFlags::HEADING_CHANGE, StatusCode::MotionHeading),
    ClassifierRule::fixed(ReasonFlags::SPEED_OVER_THRESHOLD, StatusCode::MotionExcessSpeed),
    ClassifierRule::fixed(ReasonFlags::PANIC_SWITCH, StatusCode::PanicOn),
    ClassifierRule::branch(ReasonFlags::EXT_POWER_EVENT, external_power),
    ClassifierRule::fixed(ReasonFlags::EXT_INPUT, StatusCode::InputState),
    ClassifierRule::fixed(ReasonFlags::LOW_BATTERY, StatusCode::LowBattery),
    ClassifierRule::fixed(ReasonFlags::ACCEL_MAX, StatusCode::ExcessAccel),
    ClassifierRule::fixed(ReasonFlags::DECEL_MAX, StatusCode::ExcessBraking),
    ClassifierRule::fixed(ReasonFlags::CORNERING_MAX, StatusCode::ExcessCornering),
    ClassifierRule::fixed(ReasonFlags::COLLISION, StatusCode::Impact),
    ClassifierRule::fixed(ReasonFlags::TOWING_ALARM, StatusCode::TowingStart),
    ClassifierRule::branch(ReasonFlags::GEO_FENCE, geofence),
    ClassifierRule::fixed(ReasonFlags::POWER_ON, StatusCode::Initialized),
    ClassifierRule::fixed(ReasonFlags::GPS_REACQUIRED, StatusCode::Heartbeat),
    ClassifierRule::fixed(ReasonFlags::POS_ON_DEMAND, StatusCode::Query),
    ClassifierRule::fixed(ReasonFlags::UNAUTHORISED_DRIVER, StatusCode::BreachOn),
];

/// Pick the single status code for a report.
///
/// Total: any reason combination, including none, yields a code.
pub fn classify(
    reason: ReasonFlags,
    status: StatusFlags,
    ext_power_volts: f64,
    geofence: u8,
) -> StatusCode {
    let input = ClassifierInput {
        reason,
        status,
        ext_power_volts,
        geofence,
    };
    CLASSIFIER_RULES
        .iter()
        .find_map(|rule| rule.apply(&input))
        .unwrap_or(StatusCode::Notify)
}
