//! Takeoff sequencing for multirotor vehicles.
//!
//! A [`TakeoffController`](flight_control::TakeoffController) takes the vehicle from ground
//! idle to the throttle at which it just carries its own weight, either by a timed ramp to
//! the hover throttle a [`ThrustModel`](thrust_model::ThrustModel) predicts or by a rate
//! ramp that stops and calibrates the model once the landing gear releases.
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]

pub mod config;
pub mod flight_control;
pub mod logger;
pub mod sensors;
pub mod sim;
pub mod thrust_model;
mod util;
