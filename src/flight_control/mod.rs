//! Takeoff sequencing: the takeoff state machine, the flight command it produces and the
//! ground-contact readings it is gated on.

mod command;
pub mod ground_contact;
mod sensor_suite;
mod takeoff_controller;
mod takeoff_error;
mod takeoff_state;

pub use command::{Attitude, FlightCommand};
pub use ground_contact::{ContactFeed, ContactMonitor, GroundContact, GroundContactReading, LandingGear};
pub use sensor_suite::SensorSuite;
pub use takeoff_controller::{LIFT_FRAME, MAP_FRAME, TakeoffController};
pub use takeoff_error::{FailureKind, TakeoffError};
pub use takeoff_state::TakeoffState;
