//! Sensor and actuator adapters the takeoff controller consumes.
//!
//! Each adapter is reached through an `async` trait so the controller can be driven by real
//! message plumbing or by the simulation. Every call is bounded by a timeout and fails
//! instead of blocking the control loop.

pub mod arming;
mod battery;
mod timed_buffer;
mod transform;
#[cfg(test)]
mod tests;

pub use arming::{ArmRequest, ArmResponse, ArmingClient, ArmingError, ArmingServer, ArmingService};
pub use battery::{BatteryInterpolator, VoltageSource};
pub use timed_buffer::{Interpolate, Stamped, TimedBuffer};
pub use transform::{StampedTransform, TransformBuffer, TransformLookup, Translation};

use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    Timeout,
    NoData,
    Stale,
    OutOfRange,
    OutOfOrder,
    Closed,
}

impl std::error::Error for SensorError {}
