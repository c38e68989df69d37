use super::{SensorError, TimedBuffer};
use crate::config::{ConfigError, TakeoffConfig, to_time_delta};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Source of battery voltage readings at arbitrary timestamps.
#[async_trait]
pub trait VoltageSource: Send + Sync {
    /// Waits until at least one voltage sample is available.
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), SensorError>;
    /// Voltage valid at `time`, bounded by the source's own update timeout.
    async fn interpolated_at(&self, time: DateTime<Utc>) -> Result<f64, SensorError>;
    /// Stamp of the newest voltage sample.
    fn last_update_time(&self) -> Option<DateTime<Utc>>;
}

/// Linear interpolator over the motor battery voltage stream.
#[derive(Debug)]
pub struct BatteryInterpolator {
    buffer: TimedBuffer<f64>,
    update_timeout: Duration,
}

impl BatteryInterpolator {
    pub fn new(update_timeout: Duration, battery_timeout: TimeDelta) -> Self {
        Self {
            buffer: TimedBuffer::new(TimedBuffer::<f64>::DEFAULT_CAPACITY, battery_timeout),
            update_timeout,
        }
    }

    /// Builds an interpolator with the update and battery timeouts of `config`.
    pub fn from_config(config: &TakeoffConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.update_timeout, to_time_delta(config.battery_timeout)?))
    }

    /// Feeds one voltage message into the interpolator.
    pub async fn push(&self, stamp: DateTime<Utc>, voltage: f64) -> Result<(), SensorError> {
        self.buffer.push(stamp, voltage).await
    }
}

#[async_trait]
impl VoltageSource for BatteryInterpolator {
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), SensorError> {
        self.buffer.wait_until_ready(timeout).await.map(|_| ())
    }

    async fn interpolated_at(&self, time: DateTime<Utc>) -> Result<f64, SensorError> {
        self.buffer.interpolated_at(time, self.update_timeout).await
    }

    fn last_update_time(&self) -> Option<DateTime<Utc>> { self.buffer.last_update_time() }
}
