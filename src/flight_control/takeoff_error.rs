use super::{FlightCommand, TakeoffState};
use crate::config::ConfigError;
use crate::sensors::{ArmingError, SensorError};
use crate::thrust_model::CalibrationError;
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use strum_macros::Display as StrumDisplay;

/// Coarse classification of controller failures.
#[derive(Debug, PartialEq, Eq, Clone, Copy, StrumDisplay)]
pub enum FailureKind {
    /// Stale timestamp, wrong state or missing ground contact. Nothing was changed.
    Precondition,
    /// A sensor or service did not answer in time. The maneuver can resume on a later call.
    SensorUnavailable,
    /// Physically unsafe situation. The caller must abort the maneuver.
    UnsafeCondition,
    /// The motors could not be armed. The maneuver is over until the next `prepare_for_takeover`.
    ArmingFailed,
    /// The computed command is not finite and must not be applied.
    NonFiniteCommand,
    /// The controller reached a state its strategy never enters.
    InternalFault,
}

#[derive(Debug)]
pub enum TakeoffError {
    StaleTimestamp { time: DateTime<Utc>, last_update: DateTime<Utc> },
    WrongState { expected: &'static str, actual: TakeoffState },
    NoGroundContact,
    NotReady(&'static str),
    InvalidAttitude,
    Voltage(SensorError),
    Altitude(SensorError),
    Arming(ArmingError),
    ArmRejected(String),
    ArmingLatched,
    Calibration(CalibrationError),
    UnsafeLiftoff { altitude: f64, ceiling: f64 },
    NonFiniteCommand(FlightCommand),
    InvalidState(TakeoffState),
    Config(ConfigError),
}

impl TakeoffError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TakeoffError::StaleTimestamp { .. }
            | TakeoffError::WrongState { .. }
            | TakeoffError::NoGroundContact
            | TakeoffError::Config(_) => FailureKind::Precondition,
            TakeoffError::NotReady(_)
            | TakeoffError::Voltage(_)
            | TakeoffError::Altitude(_)
            | TakeoffError::Calibration(_) => FailureKind::SensorUnavailable,
            TakeoffError::Arming(_) | TakeoffError::ArmRejected(_) | TakeoffError::ArmingLatched => {
                FailureKind::ArmingFailed
            }
            TakeoffError::UnsafeLiftoff { .. } => FailureKind::UnsafeCondition,
            TakeoffError::InvalidAttitude | TakeoffError::NonFiniteCommand(_) => {
                FailureKind::NonFiniteCommand
            }
            TakeoffError::InvalidState(_) => FailureKind::InternalFault,
        }
    }

    /// Whether the current maneuver must be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::UnsafeCondition | FailureKind::ArmingFailed | FailureKind::InternalFault
        )
    }
}

impl Display for TakeoffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TakeoffError::StaleTimestamp { time, last_update } => {
                write!(f, "time {time} is before the last update at {last_update}")
            }
            TakeoffError::WrongState { expected, actual } => {
                write!(f, "expected {expected}, controller is in {actual}")
            }
            TakeoffError::NoGroundContact => write!(f, "vehicle is not resting on the ground"),
            TakeoffError::NotReady(what) => write!(f, "timed out waiting for {what}"),
            TakeoffError::InvalidAttitude => write!(f, "attitude passed to update is not finite"),
            TakeoffError::Voltage(e) => write!(f, "failed to get battery voltage: {e}"),
            TakeoffError::Altitude(e) => write!(f, "failed to get center of lift height: {e}"),
            TakeoffError::Arming(e) => write!(f, "arming service failed: {e}"),
            TakeoffError::ArmRejected(msg) => write!(f, "arming service refused to arm: {msg}"),
            TakeoffError::ArmingLatched => {
                write!(f, "arming already failed, abort and prepare the takeoff again")
            }
            TakeoffError::Calibration(e) => write!(f, "thrust model calibration failed: {e}"),
            TakeoffError::UnsafeLiftoff { altitude, ceiling } => write!(
                f,
                "center of lift at {altitude:.3}m above {ceiling:.3}m with ground contact still engaged"
            ),
            TakeoffError::NonFiniteCommand(cmd) => write!(f, "part of command is not finite: {cmd}"),
            TakeoffError::InvalidState(state) => write!(f, "invalid state {state} for strategy"),
            TakeoffError::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for TakeoffError {}

impl From<ArmingError> for TakeoffError {
    fn from(value: ArmingError) -> Self { TakeoffError::Arming(value) }
}

impl From<CalibrationError> for TakeoffError {
    fn from(value: CalibrationError) -> Self { TakeoffError::Calibration(value) }
}

impl From<ConfigError> for TakeoffError {
    fn from(value: ConfigError) -> Self { TakeoffError::Config(value) }
}
