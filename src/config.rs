//! Construction-time configuration of the takeoff controller.
//!
//! All values are fixed once a [`TakeoffController`](crate::flight_control::TakeoffController)
//! is built; [`TakeoffConfig::validate`] is run by the constructor.

use crate::flight_control::TakeoffState;
use chrono::TimeDelta;
use std::time::Duration;
use strum_macros::Display;

/// Standard gravity used to turn the vehicle mass into the hover thrust.
pub const GRAVITY: f64 = 9.8;

const DEFAULT_POST_ARM_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_RAMP_DURATION: Duration = Duration::from_secs(3);
const DEFAULT_RAMP_RATE: f64 = 0.2;
const DEFAULT_MAX_SWITCH_ENGAGED_ALTITUDE: f64 = 0.3;
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_millis(100);
const DEFAULT_BATTERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Selects how the controller sequences the throttle from ground idle to hover.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RampStrategy {
    /// Arm, wait `post_arm_delay`, then ramp linearly over `ramp_duration` to the hover
    /// throttle predicted by the thrust model.
    TimedHover { post_arm_delay: Duration, ramp_duration: Duration },
    /// Ramp at `ramp_rate` (throttle per second) until the ground-contact switches release,
    /// then calibrate the thrust model with the liftoff sample.
    SwitchRelease { ramp_rate: f64, max_switch_engaged_altitude: f64 },
}

impl RampStrategy {
    pub fn timed_hover() -> Self {
        Self::TimedHover {
            post_arm_delay: DEFAULT_POST_ARM_DELAY,
            ramp_duration: DEFAULT_RAMP_DURATION,
        }
    }

    pub fn switch_release() -> Self {
        Self::SwitchRelease {
            ramp_rate: DEFAULT_RAMP_RATE,
            max_switch_engaged_altitude: DEFAULT_MAX_SWITCH_ENGAGED_ALTITUDE,
        }
    }

    /// The first active state entered by `prepare_for_takeover`.
    pub fn initial_state(&self) -> TakeoffState {
        match self {
            Self::TimedHover { .. } => TakeoffState::Arm,
            Self::SwitchRelease { .. } => TakeoffState::Ramp,
        }
    }

    /// Whether `state` is part of this strategy's state sequence.
    pub fn uses_state(&self, state: TakeoffState) -> bool {
        match self {
            Self::TimedHover { .. } => true,
            Self::SwitchRelease { .. } => matches!(state, TakeoffState::Ramp | TakeoffState::Done),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TimedHover { .. } => "timed hover ramp",
            Self::SwitchRelease { .. } => "switch release ramp",
        }
    }
}

impl Default for RampStrategy {
    fn default() -> Self { Self::timed_hover() }
}

/// Physical vehicle parameters needed to compute the hover thrust.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VehicleParams {
    /// Vehicle mass in kilograms.
    pub mass: f64,
    pub motor_count: usize,
}

impl VehicleParams {
    /// Thrust in Newtons needed to hold the vehicle's weight.
    pub fn hover_thrust(&self) -> f64 { self.mass * GRAVITY }
}

impl Default for VehicleParams {
    fn default() -> Self { Self { mass: 1.0, motor_count: 4 } }
}

/// Full controller configuration.
///
/// # Fields
/// - `strategy`: The ramp strategy and its timing parameters.
/// - `startup_timeout`: Default bound for `wait_until_ready`.
/// - `update_timeout`: Bound for every sensor lookup and arm request inside `update`.
/// - `battery_timeout`: Maximum gap between two voltage samples that may be interpolated.
/// - `vehicle`: Mass and motor count.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TakeoffConfig {
    pub strategy: RampStrategy,
    pub startup_timeout: Duration,
    pub update_timeout: Duration,
    pub battery_timeout: Duration,
    pub vehicle: VehicleParams,
}

impl TakeoffConfig {
    pub fn new(strategy: RampStrategy) -> Self {
        Self {
            strategy,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            update_timeout: DEFAULT_UPDATE_TIMEOUT,
            battery_timeout: DEFAULT_BATTERY_TIMEOUT,
            vehicle: VehicleParams::default(),
        }
    }

    /// Checks every value for physical plausibility.
    ///
    /// # Returns
    /// - `Ok(())` if the controller can be built from this configuration.
    /// - `Err(ConfigError)` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.strategy {
            RampStrategy::TimedHover { post_arm_delay, ramp_duration } => {
                to_time_delta(post_arm_delay)?;
                if ramp_duration.is_zero() {
                    return Err(ConfigError::ZeroRampDuration);
                }
                to_time_delta(ramp_duration)?;
            }
            RampStrategy::SwitchRelease { ramp_rate, max_switch_engaged_altitude } => {
                if !ramp_rate.is_finite() || ramp_rate <= 0.0 {
                    return Err(ConfigError::InvalidRampRate(ramp_rate));
                }
                if !max_switch_engaged_altitude.is_finite() || max_switch_engaged_altitude < 0.0 {
                    return Err(ConfigError::InvalidSafetyAltitude(max_switch_engaged_altitude));
                }
            }
        }
        for timeout in [self.startup_timeout, self.update_timeout, self.battery_timeout] {
            to_time_delta(timeout)?;
        }
        if !self.vehicle.mass.is_finite() || self.vehicle.mass <= 0.0 {
            return Err(ConfigError::InvalidMass(self.vehicle.mass));
        }
        if self.vehicle.motor_count == 0 {
            return Err(ConfigError::NoMotors);
        }
        Ok(())
    }
}

impl Default for TakeoffConfig {
    fn default() -> Self { Self::new(RampStrategy::default()) }
}

/// Converts a configured duration into the controller's time arithmetic type.
pub(crate) fn to_time_delta(duration: Duration) -> Result<TimeDelta, ConfigError> {
    TimeDelta::from_std(duration).map_err(|_| ConfigError::DurationOutOfRange(duration))
}

#[derive(Debug, Display, PartialEq)]
pub enum ConfigError {
    ZeroRampDuration,
    InvalidRampRate(f64),
    InvalidSafetyAltitude(f64),
    InvalidMass(f64),
    NoMotors,
    DurationOutOfRange(Duration),
}

impl std::error::Error for ConfigError {}
