use super::{CalibrationError, ThrustModel};

/// Thrust model with a ground effect term and a polynomial thrust-to-voltage curve.
///
/// Per-motor thrust `t` (after removing ground effect and the scale factor) maps to the
/// motor voltage `v = c0 + c1 * t + c2 * t^2 + ...`. The curve is expected to be
/// increasing for non-negative thrust.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PolynomialThrustModel {
    /// Multiplier from model thrust to real thrust. This is what calibration adjusts.
    thrust_scale_factor: f64,
    /// Ground effect gain.
    ground_effect_gain: f64,
    /// Ground effect decay distance in meters.
    ground_effect_distance: f64,
    /// Thrust-to-voltage coefficients, lowest order first.
    voltage_polynomial: Vec<f64>,
    /// Total thrust produced at the liftoff instant, i.e. the vehicle weight.
    liftoff_thrust: f64,
    motor_count: usize,
}

impl PolynomialThrustModel {
    const BISECTION_STEPS: usize = 100;
    const BRACKET_EXPANSIONS: usize = 64;
    const SOLVE_TOLERANCE: f64 = 1e-12;

    pub fn new(
        thrust_scale_factor: f64,
        ground_effect_gain: f64,
        ground_effect_distance: f64,
        voltage_polynomial: Vec<f64>,
        liftoff_thrust: f64,
        motor_count: usize,
    ) -> Self {
        Self {
            thrust_scale_factor,
            ground_effect_gain,
            ground_effect_distance,
            voltage_polynomial,
            liftoff_thrust,
            motor_count,
        }
    }

    pub fn thrust_scale_factor(&self) -> f64 { self.thrust_scale_factor }

    /// Thrust multiplier caused by the ground below the rotors.
    pub fn ground_effect(&self, altitude: f64) -> f64 {
        if self.ground_effect_distance <= 0.0 {
            return 1.0;
        }
        1.0 + self.ground_effect_gain * (-altitude.max(0.0) / self.ground_effect_distance).exp()
    }

    fn polynomial_at(&self, x: f64) -> f64 {
        self.voltage_polynomial.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Finds the per-motor model thrust whose voltage equals `target`.
    fn invert_polynomial(&self, target: f64) -> Option<f64> {
        let mut low = 0.0;
        let mut high = 1.0;
        if self.polynomial_at(low) > target {
            return None;
        }
        let mut expansions = 0;
        while self.polynomial_at(high) < target {
            low = high;
            high *= 2.0;
            expansions += 1;
            if expansions > Self::BRACKET_EXPANSIONS {
                return None;
            }
        }
        for _ in 0..Self::BISECTION_STEPS {
            let mid = 0.5 * (low + high);
            if self.polynomial_at(mid) < target {
                low = mid;
            } else {
                high = mid;
            }
            if high - low < Self::SOLVE_TOLERANCE {
                break;
            }
        }
        Some(0.5 * (low + high))
    }
}

impl ThrustModel for PolynomialThrustModel {
    #[allow(clippy::cast_precision_loss)]
    fn voltage_from_thrust(&self, thrust: f64, motor_count: usize, altitude: f64) -> f64 {
        if motor_count == 0 {
            return f64::NAN;
        }
        let per_motor = thrust / motor_count as f64;
        let model_thrust = per_motor / (self.ground_effect(altitude) * self.thrust_scale_factor);
        self.polynomial_at(model_thrust)
    }

    #[allow(clippy::cast_precision_loss)]
    fn calibrate(&mut self, throttle: f64, voltage: f64, altitude: f64) -> Result<(), CalibrationError> {
        if !(throttle.is_finite() && voltage.is_finite() && altitude.is_finite()) {
            return Err(CalibrationError::NonFiniteSample);
        }
        if throttle <= 0.0 || throttle > 1.0 {
            return Err(CalibrationError::ThrottleOutOfRange(throttle));
        }
        if voltage <= 0.0 {
            return Err(CalibrationError::NonPositiveVoltage(voltage));
        }
        if self.motor_count == 0 {
            return Err(CalibrationError::NoSolution);
        }
        let motor_voltage = throttle * voltage;
        let model_thrust = self
            .invert_polynomial(motor_voltage)
            .filter(|t| *t > 0.0)
            .ok_or(CalibrationError::NoSolution)?;
        let real_thrust = self.liftoff_thrust / self.motor_count as f64 / self.ground_effect(altitude);
        let scale = real_thrust / model_thrust;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CalibrationError::NoSolution);
        }
        self.thrust_scale_factor = scale;
        Ok(())
    }
}
