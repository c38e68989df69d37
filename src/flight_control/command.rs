use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// Attitude part of a flight command. The takeoff controller passes it through unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Attitude {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Attitude {
    pub fn level() -> Self { Self::default() }

    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.roll.is_finite() && self.yaw.is_finite()
    }
}

/// Orientation and throttle command sent to the flight controller.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlightCommand {
    stamp: DateTime<Utc>,
    throttle: f64,
    attitude: Attitude,
}

impl FlightCommand {
    pub fn new(stamp: DateTime<Utc>, throttle: f64, attitude: Attitude) -> Self {
        Self { stamp, throttle, attitude }
    }

    pub fn stamp(&self) -> DateTime<Utc> { self.stamp }
    pub fn throttle(&self) -> f64 { self.throttle }
    pub fn attitude(&self) -> Attitude { self.attitude }

    /// A command may only be applied if all four numeric fields are finite.
    pub fn is_finite(&self) -> bool { self.throttle.is_finite() && self.attitude.is_finite() }
}

impl Display for FlightCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Throttle: {:.4} Pitch: {:.4} Roll: {:.4} Yaw: {:.4}",
            self.throttle, self.attitude.pitch, self.attitude.roll, self.attitude.yaw
        )
    }
}
