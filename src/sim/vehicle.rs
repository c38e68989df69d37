use crate::config::{ConfigError, GRAVITY, TakeoffConfig, to_time_delta};
use crate::flight_control::{
    ContactFeed, FlightCommand, GroundContact, GroundContactReading, LIFT_FRAME, LandingGear, MAP_FRAME,
    SensorSuite, ground_contact,
};
use crate::sensors::{
    ArmResponse, ArmingServer, BatteryInterpolator, SensorError, TransformBuffer, Translation, arming,
};
use crate::thrust_model::PolynomialThrustModel;
use crate::util::seconds;
use crate::{info, log, warn};
use chrono::{DateTime, Utc};
use rand::random_range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Physical parameters of the simulated vehicle.
///
/// # Fields
/// - `hover_motor_voltage`: Motor voltage at which thrust exactly carries the weight.
/// - `resting_voltage`: Battery voltage without load.
/// - `voltage_sag`: Voltage drop per unit of throttle.
/// - `voltage_noise`: Half width of the uniform noise added to every voltage sample.
/// - `lift_offset`: Height of the center of lift above the map origin while resting.
/// - `switch_travel`: Height above rest at which the landing gear switches open.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimParams {
    pub hover_motor_voltage: f64,
    pub resting_voltage: f64,
    pub voltage_sag: f64,
    pub voltage_noise: f64,
    pub lift_offset: f64,
    pub switch_travel: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            hover_motor_voltage: 7.2,
            resting_voltage: 12.6,
            voltage_sag: 0.8,
            voltage_noise: 0.02,
            lift_offset: 0.05,
            switch_travel: 0.005,
        }
    }
}

impl SimParams {
    /// Uncalibrated thrust model roughly matching this vehicle.
    pub fn thrust_model(&self, config: &TakeoffConfig) -> PolynomialThrustModel {
        PolynomialThrustModel::new(
            1.0,
            0.1,
            0.2,
            vec![0.0, 2.9],
            config.vehicle.hover_thrust(),
            config.vehicle.motor_count,
        )
    }
}

#[derive(Debug, Default)]
struct Dynamics {
    /// Height of the gear above the ground.
    height: f64,
    vertical_speed: f64,
    throttle: f64,
    last_tick: Option<DateTime<Utc>>,
}

/// Simulated vehicle publishing battery, transform and ground-contact data and serving
/// arm requests, closed over the commands of a takeoff controller.
pub struct SimVehicle {
    params: SimParams,
    dynamics: RwLock<Dynamics>,
    transforms: Arc<TransformBuffer>,
    battery: Arc<BatteryInterpolator>,
    contact: ContactFeed,
    armed: Arc<AtomicBool>,
    arming_task: JoinHandle<()>,
}

impl SimVehicle {
    const TRANSFORM_CAPACITY: usize = 100;

    /// Creates the vehicle resting on the ground together with the collaborators a
    /// controller needs to fly it. Must be called inside a tokio runtime.
    ///
    /// # Arguments
    /// - `params`: Physical parameters.
    /// - `config`: Controller configuration the timeouts are taken from.
    /// - `armed`: Whether the motors start armed. The switch release ramp never requests arming.
    pub fn new(params: SimParams, config: &TakeoffConfig, armed: bool) -> Result<(Self, SensorSuite), ConfigError> {
        let battery = Arc::new(BatteryInterpolator::from_config(config)?);
        let transforms = Arc::new(TransformBuffer::new(
            Self::TRANSFORM_CAPACITY,
            to_time_delta(config.battery_timeout)?,
        ));
        let (contact, monitor) = ground_contact::channel();
        let (client, server) = arming::channel(config.update_timeout);
        let armed = Arc::new(AtomicBool::new(armed));
        let arming_task = tokio::spawn(Self::serve_arming(server, Arc::clone(&armed)));

        let suite = SensorSuite {
            transforms: transforms.clone(),
            battery: battery.clone(),
            arming: Arc::new(client),
            contact: monitor,
        };
        let vehicle = Self {
            params,
            dynamics: RwLock::new(Dynamics::default()),
            transforms,
            battery,
            contact,
            armed,
            arming_task,
        };
        Ok((vehicle, suite))
    }

    async fn serve_arming(mut server: ArmingServer, armed: Arc<AtomicBool>) {
        while let Some(request) = server.next_request().await {
            let arm = request.arm();
            armed.store(arm, Ordering::SeqCst);
            log!("Simulated flight controller {}", if arm { "armed" } else { "disarmed" });
            request.respond(ArmResponse::accepted());
        }
    }

    pub fn is_armed(&self) -> bool { self.armed.load(Ordering::SeqCst) }

    /// Height of the landing gear above the ground.
    pub async fn height(&self) -> f64 { self.dynamics.read().await.height }

    /// Applies the throttle of `command` from the next tick on.
    pub async fn apply(&self, command: &FlightCommand) {
        self.dynamics.write().await.throttle = command.throttle().clamp(0.0, 1.0);
    }

    /// Advances the simulation to `now` and publishes one sample on every channel.
    ///
    /// # Returns
    /// - `Err(SensorError::OutOfOrder)` if `now` is before the previous tick.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<(), SensorError> {
        let (height, voltage) = {
            let mut dyn_state = self.dynamics.write().await;
            let dt = dyn_state.last_tick.map_or(0.0, |last| seconds(now - last));
            if dt < 0.0 {
                return Err(SensorError::OutOfOrder);
            }
            let voltage = self.params.resting_voltage - self.params.voltage_sag * dyn_state.throttle;
            let thrust_ratio = if self.is_armed() {
                dyn_state.throttle * voltage / self.params.hover_motor_voltage
            } else {
                0.0
            };
            let accel = GRAVITY * (thrust_ratio - 1.0);
            if dyn_state.height <= 0.0 && accel <= 0.0 {
                dyn_state.vertical_speed = 0.0;
            } else {
                dyn_state.vertical_speed += accel * dt;
                dyn_state.height += dyn_state.vertical_speed * dt;
                if dyn_state.height < 0.0 {
                    dyn_state.height = 0.0;
                    dyn_state.vertical_speed = 0.0;
                }
            }
            dyn_state.last_tick = Some(now);
            (dyn_state.height, voltage)
        };

        let noise = if self.params.voltage_noise > 0.0 {
            random_range(-self.params.voltage_noise..=self.params.voltage_noise)
        } else {
            0.0
        };
        self.battery.push(now, voltage + noise).await?;
        self.transforms
            .publish(
                MAP_FRAME,
                LIFT_FRAME,
                now,
                Translation::new(0.0, 0.0, self.params.lift_offset + height),
            )
            .await?;
        let gear = if height > self.params.switch_travel {
            LandingGear::all_released()
        } else {
            LandingGear::all_pressed()
        };
        self.contact.publish(GroundContactReading::new(now, GroundContact::Switches(gear)));
        Ok(())
    }

    /// Stops answering arm requests.
    pub fn shutdown(&self) {
        if !self.arming_task.is_finished() {
            warn!("Stopping simulated arming service");
        }
        self.arming_task.abort();
        info!("Simulation stopped");
    }
}
