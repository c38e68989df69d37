//! Closed-loop vehicle simulation used by the `takeoff-sim` binary and the end to end tests.

mod vehicle;

pub use vehicle::{SimParams, SimVehicle};
