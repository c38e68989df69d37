use super::{
    Attitude, FlightCommand, SensorSuite, TakeoffError, TakeoffState,
    ground_contact::GroundContactReading,
};
use crate::config::{RampStrategy, TakeoffConfig, to_time_delta};
use crate::thrust_model::ThrustModel;
use crate::util::{latest_stamp, seconds};
use crate::{error, event, info, log, warn};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// World frame all heights are measured in.
pub const MAP_FRAME: &str = "map";
/// Frame at the vehicle's center of lift; its height feeds the thrust model.
pub const LIFT_FRAME: &str = "center_of_lift";

/// Timing of the active strategy, converted once at construction.
#[derive(Debug, Clone, Copy)]
enum RampTiming {
    Timed { post_arm_delay: TimeDelta, ramp_duration: TimeDelta },
    SwitchRelease { ramp_rate: f64, max_switch_engaged_altitude: f64 },
}

/// Sample handed to the thrust model when the vehicle leaves the ground.
#[derive(Debug, Clone, Copy)]
struct LiftoffSample {
    throttle: f64,
    voltage: f64,
    altitude: f64,
}

/// Pending result of one `update` cycle, committed only if the whole cycle succeeds.
#[derive(Debug, Clone, Copy)]
struct Step {
    state: TakeoffState,
    throttle: f64,
    arm_time: Option<DateTime<Utc>>,
    ramp_start_time: Option<DateTime<Utc>>,
    hover_throttle: Option<f64>,
    liftoff: Option<LiftoffSample>,
}

/// Drives the vehicle from ground idle to a stable hover throttle.
///
/// The controller is created in [`TakeoffState::Done`]. A maneuver is
/// `wait_until_ready` once, then `prepare_for_takeover`, then `update` at the control loop
/// rate until `is_done`. A failed call leaves state, throttle and timers untouched and the
/// command of a failed `update` must not be applied. A failed arm request also ends the
/// maneuver: later updates fail until it is aborted and prepared again.
pub struct TakeoffController<M: ThrustModel> {
    config: TakeoffConfig,
    timing: RampTiming,
    thrust_model: M,
    sensors: SensorSuite,
    state: TakeoffState,
    throttle: f64,
    recorded_hover_throttle: Option<f64>,
    last_update_time: Option<DateTime<Utc>>,
    arm_time: Option<DateTime<Utc>>,
    ramp_start_time: Option<DateTime<Utc>>,
    /// Set when an arm request failed; only `prepare_for_takeover` clears it.
    arm_failed: bool,
}

impl<M: ThrustModel> TakeoffController<M> {
    /// Creates a controller in the `Done` state.
    ///
    /// # Returns
    /// - `Err(TakeoffError::Config)` if `config` does not validate.
    pub fn new(config: TakeoffConfig, thrust_model: M, sensors: SensorSuite) -> Result<Self, TakeoffError> {
        config.validate()?;
        let timing = match config.strategy {
            RampStrategy::TimedHover { post_arm_delay, ramp_duration } => RampTiming::Timed {
                post_arm_delay: to_time_delta(post_arm_delay)?,
                ramp_duration: to_time_delta(ramp_duration)?,
            },
            RampStrategy::SwitchRelease { ramp_rate, max_switch_engaged_altitude } => {
                RampTiming::SwitchRelease { ramp_rate, max_switch_engaged_altitude }
            }
        };
        Ok(Self {
            config,
            timing,
            thrust_model,
            sensors,
            state: TakeoffState::Done,
            throttle: 0.0,
            recorded_hover_throttle: None,
            last_update_time: None,
            arm_time: None,
            ramp_start_time: None,
            arm_failed: false,
        })
    }

    pub fn state(&self) -> TakeoffState { self.state }
    pub fn is_done(&self) -> bool { self.state == TakeoffState::Done }
    pub fn throttle(&self) -> f64 { self.throttle }
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> { self.last_update_time }
    /// Hover throttle recorded by the last ramp, `None` before the first ramp cycle.
    pub fn hover_throttle(&self) -> Option<f64> { self.recorded_hover_throttle }
    pub fn thrust_model(&self) -> &M { &self.thrust_model }
    /// Hands the (possibly calibrated) thrust model over to the next controller.
    pub fn into_thrust_model(self) -> M { self.thrust_model }

    /// Waits until the center of lift transform, the battery voltage and the first
    /// ground-contact message are all available, or `timeout` elapses.
    ///
    /// On success the last update time is seeded with the newest of the three stamps so the
    /// first ramp cycle does not see a large time jump. On failure nothing is changed.
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), TakeoffError> {
        let deadline = Instant::now() + timeout;
        let remaining = || deadline.saturating_duration_since(Instant::now());

        let transform = self
            .sensors
            .transforms
            .transform_at(MAP_FRAME, LIFT_FRAME, None, remaining())
            .await
            .map_err(|e| {
                error!("Failed to fetch transform for map to center of lift: {e}");
                TakeoffError::NotReady("map to center of lift transform")
            })?;

        self.sensors.battery.wait_until_ready(remaining()).await.map_err(|e| {
            error!("Failed to fetch battery voltage: {e}");
            TakeoffError::NotReady("battery voltage")
        })?;

        let contact: GroundContactReading =
            self.sensors.contact.wait_first(remaining()).await.ok_or_else(|| {
                error!("Takeoff controller failed to fetch initial ground contact message");
                TakeoffError::NotReady("ground contact message")
            })?;

        self.last_update_time = latest_stamp([
            self.last_update_time,
            Some(transform.stamp),
            Some(contact.stamp),
            self.sensors.battery.last_update_time(),
        ]);
        info!("Takeoff controller ready using {}", self.config.strategy.name());
        Ok(())
    }

    /// Resets the controller for a new takeoff starting at `time`.
    ///
    /// Only legal from `Done` while the vehicle is fully resting on the ground.
    pub fn prepare_for_takeover(&mut self, time: DateTime<Utc>) -> Result<(), TakeoffError> {
        self.check_time(time, "reset")?;
        let on_ground = self.sensors.contact.latest().is_some_and(|r| r.contact.is_engaged());
        if !on_ground {
            error!("Tried to reset the takeoff controller without being on the ground");
            return Err(TakeoffError::NoGroundContact);
        }
        if self.state != TakeoffState::Done {
            error!("Tried to reset takeoff controller that wasn't in the {} state", TakeoffState::Done);
            return Err(TakeoffError::WrongState { expected: "DONE", actual: self.state });
        }

        self.throttle = 0.0;
        self.state = self.config.strategy.initial_state();
        self.arm_time = None;
        self.ramp_start_time = None;
        self.arm_failed = false;
        // Restart the ramp timers here so resuming does not jump the throttle
        self.last_update_time = Some(time);
        log!("Takeoff controller prepared, starting in {}", self.state);
        Ok(())
    }

    /// Abandons the current maneuver and returns to `Done` with zero throttle.
    ///
    /// Used after a fatal error or a failed arm request so a later `prepare_for_takeover`
    /// can start over. The last update time is kept.
    pub fn abort(&mut self) {
        if self.state != TakeoffState::Done {
            warn!("Aborting takeoff in {} state", self.state);
        }
        self.state = TakeoffState::Done;
        self.throttle = 0.0;
        self.arm_time = None;
        self.ramp_start_time = None;
    }

    /// Advances the takeoff by one control cycle and returns the command for `time`.
    ///
    /// `attitude` is passed through to the command unchanged.
    pub async fn update(&mut self, time: DateTime<Utc>, attitude: Attitude) -> Result<FlightCommand, TakeoffError> {
        self.check_time(time, "update")?;
        if !attitude.is_finite() {
            error!("Attitude passed to the takeoff controller is not finite");
            return Err(TakeoffError::InvalidAttitude);
        }

        let mut step = Step {
            state: self.state,
            throttle: self.throttle,
            arm_time: self.arm_time,
            ramp_start_time: self.ramp_start_time,
            hover_throttle: self.recorded_hover_throttle,
            liftoff: None,
        };

        if !self.config.strategy.uses_state(self.state) {
            return Err(self.internal_fault());
        }
        match (self.state, self.timing) {
            (TakeoffState::Arm, RampTiming::Timed { .. }) => {
                if self.arm_failed {
                    error!("Arming already failed, takeoff must be prepared again");
                    return Err(TakeoffError::ArmingLatched);
                }
                if let Err(e) = self.arm().await {
                    self.arm_failed = true;
                    return Err(e);
                }
                step.arm_time = Some(time);
                step.state = TakeoffState::Pause;
            }
            (TakeoffState::Pause, RampTiming::Timed { post_arm_delay, .. }) => {
                let Some(arm_time) = self.arm_time else {
                    return Err(self.internal_fault());
                };
                if time > arm_time + post_arm_delay {
                    step.state = TakeoffState::Ramp;
                    step.ramp_start_time = Some(time);
                }
            }
            (TakeoffState::Ramp, RampTiming::Timed { ramp_duration, .. }) => {
                self.timed_ramp(time, ramp_duration, &mut step).await?;
            }
            (TakeoffState::Ramp, RampTiming::SwitchRelease { ramp_rate, max_switch_engaged_altitude }) => {
                self.switch_release_ramp(time, ramp_rate, max_switch_engaged_altitude, &mut step).await?;
            }
            (TakeoffState::Done, _) => {
                error!("Tried to update takeoff controller when in {} state", TakeoffState::Done);
                return Err(TakeoffError::WrongState {
                    expected: "an active takeoff state",
                    actual: TakeoffState::Done,
                });
            }
            _ => return Err(self.internal_fault()),
        }

        let command = FlightCommand::new(time, step.throttle, attitude);
        if !command.is_finite() {
            error!("Part of command is not finite in takeoff controller update: {command}");
            return Err(TakeoffError::NonFiniteCommand(command));
        }

        if let Some(sample) = step.liftoff {
            self.thrust_model
                .calibrate(sample.throttle, sample.voltage, sample.altitude)
                .map_err(|e| {
                    error!("Failed to calibrate thrust model at liftoff: {e}");
                    TakeoffError::from(e)
                })?;
            info!(
                "Liftoff detected, calibrated thrust model at throttle {:.4}, {:.3}V, height {:.3}m",
                sample.throttle, sample.voltage, sample.altitude
            );
        }

        event!("{command}");
        self.commit(step, time);
        Ok(command)
    }

    fn commit(&mut self, step: Step, time: DateTime<Utc>) {
        debug_assert!(
            step.state == self.state || self.state.successors().contains(&step.state),
            "illegal takeoff transition {} -> {}",
            self.state,
            step.state
        );
        if step.state != self.state {
            log!("Takeoff state {} -> {}", self.state, step.state);
            if step.state == TakeoffState::Done {
                info!("Takeoff complete with throttle {:.4}", step.throttle);
            }
        }
        self.state = step.state;
        self.throttle = step.throttle;
        self.arm_time = step.arm_time;
        self.ramp_start_time = step.ramp_start_time;
        self.recorded_hover_throttle = step.hover_throttle;
        self.last_update_time = Some(time);
    }

    fn check_time(&self, time: DateTime<Utc>, action: &str) -> Result<(), TakeoffError> {
        match self.last_update_time {
            Some(last_update) if time < last_update => {
                error!("Tried to {action} takeoff controller with time before last update");
                Err(TakeoffError::StaleTimestamp { time, last_update })
            }
            _ => Ok(()),
        }
    }

    fn internal_fault(&self) -> TakeoffError {
        error!(
            "Invalid state {} in takeoff controller using {}",
            self.state,
            self.config.strategy.name()
        );
        TakeoffError::InvalidState(self.state)
    }

    async fn arm(&self) -> Result<(), TakeoffError> {
        match self.sensors.arming.request_arm(true).await {
            Ok(response) if response.success => Ok(()),
            Ok(response) => {
                error!("Service could not arm the controller: {}", response.message);
                Err(TakeoffError::ArmRejected(response.message))
            }
            Err(e) => {
                error!("Arming service failed: {e}");
                Err(e.into())
            }
        }
    }

    async fn voltage_at(&self, time: DateTime<Utc>) -> Result<f64, TakeoffError> {
        self.sensors.battery.interpolated_at(time).await.map_err(|e| {
            error!("Failed to get battery voltage to interpret results of thrust model: {e}");
            TakeoffError::Voltage(e)
        })
    }

    async fn lift_altitude_at(&self, time: DateTime<Utc>) -> Result<f64, TakeoffError> {
        self.sensors
            .transforms
            .transform_at(MAP_FRAME, LIFT_FRAME, Some(time), self.config.update_timeout)
            .await
            .map(|tf| tf.translation.z)
            .map_err(|e| {
                error!("Takeoff controller failed to get height transform: {e}");
                TakeoffError::Altitude(e)
            })
    }

    /// Linear ramp towards the hover throttle predicted for the current voltage and height.
    async fn timed_ramp(
        &self,
        time: DateTime<Utc>,
        ramp_duration: TimeDelta,
        step: &mut Step,
    ) -> Result<(), TakeoffError> {
        let Some(ramp_start) = self.ramp_start_time else {
            return Err(self.internal_fault());
        };
        let elapsed = time - ramp_start;
        if elapsed > ramp_duration {
            step.state = TakeoffState::Done;
            return Ok(());
        }

        let voltage = self.voltage_at(time).await?;
        let altitude = self.lift_altitude_at(time).await?;
        let vehicle = self.config.vehicle;
        let hover_throttle = self.thrust_model.voltage_from_thrust(
            vehicle.hover_thrust(),
            vehicle.motor_count,
            altitude,
        ) / voltage;

        step.hover_throttle = Some(hover_throttle);
        step.throttle = seconds(elapsed) / seconds(ramp_duration) * hover_throttle;
        Ok(())
    }

    /// Rate limited ramp until the ground contact releases, then calibrates at liftoff.
    async fn switch_release_ramp(
        &self,
        time: DateTime<Utc>,
        ramp_rate: f64,
        max_switch_engaged_altitude: f64,
        step: &mut Step,
    ) -> Result<(), TakeoffError> {
        let altitude = self.lift_altitude_at(time).await?;
        let Some(reading) = self.sensors.contact.latest() else {
            error!("Takeoff controller has no ground contact reading");
            return Err(TakeoffError::NoGroundContact);
        };

        if altitude > max_switch_engaged_altitude && reading.contact.is_engaged() {
            error!(
                "Center of lift at {altitude:.3}m is above {max_switch_engaged_altitude:.3}m \
                 but ground contact is still engaged, aborting takeoff"
            );
            return Err(TakeoffError::UnsafeLiftoff { altitude, ceiling: max_switch_engaged_altitude });
        }

        if reading.contact.is_released() {
            let voltage = self.voltage_at(time).await?;
            step.liftoff = Some(LiftoffSample { throttle: self.throttle, voltage, altitude });
            step.hover_throttle = Some(self.throttle);
            step.state = TakeoffState::Done;
        } else {
            let dt = self.last_update_time.map_or(0.0, |last| seconds(time - last));
            step.throttle = (self.throttle + ramp_rate * dt).min(1.0);
        }
        Ok(())
    }
}
