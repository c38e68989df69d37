use super::ground_contact::ContactMonitor;
use crate::sensors::{ArmingService, TransformLookup, VoltageSource};
use std::sync::Arc;

/// Bundle of the external collaborators a takeoff controller reads from and commands.
///
/// # Fields
/// - `transforms`: Frame lookup used for the center of lift height.
/// - `battery`: Interpolated motor battery voltage.
/// - `arming`: Arm request/response channel to the flight controller.
/// - `contact`: Latest ground-contact reading.
#[derive(Clone)]
pub struct SensorSuite {
    pub transforms: Arc<dyn TransformLookup>,
    pub battery: Arc<dyn VoltageSource>,
    pub arming: Arc<dyn ArmingService>,
    pub contact: ContactMonitor,
}
