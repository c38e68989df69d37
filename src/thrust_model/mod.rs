//! Physical thrust/voltage model consumed by the takeoff controller.
//!
//! The controller uses the model in two directions: predicting the motor voltage that
//! produces a given thrust (to find the hover throttle), and calibrating the model from
//! the throttle, battery voltage and altitude observed at the moment of liftoff.

mod polynomial;

pub use polynomial::PolynomialThrustModel;

use strum_macros::Display;

/// Converts required thrust into required motor voltage and accepts a liftoff calibration sample.
pub trait ThrustModel: Send + Sync {
    /// Motor voltage needed for `motor_count` motors to produce `thrust` Newtons in total
    /// with the center of lift at `altitude` meters.
    ///
    /// Deterministic for a fixed calibration state. May return a non-finite value for
    /// degenerate input; callers must check.
    fn voltage_from_thrust(&self, thrust: f64, motor_count: usize, altitude: f64) -> f64;

    /// Adjusts the model from the sample observed when the vehicle left the ground.
    ///
    /// On error the model is left unchanged.
    fn calibrate(&mut self, throttle: f64, voltage: f64, altitude: f64) -> Result<(), CalibrationError>;
}

#[derive(Debug, Display, PartialEq)]
pub enum CalibrationError {
    NonFiniteSample,
    ThrottleOutOfRange(f64),
    NonPositiveVoltage(f64),
    NoSolution,
}

impl std::error::Error for CalibrationError {}
