use super::SensorError;
use crate::util::seconds;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Values that can be linearly interpolated between two samples.
pub trait Interpolate: Copy + Send + Sync {
    fn interpolate(&self, other: &Self, fraction: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, fraction: f64) -> Self { self + (other - self) * fraction }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub stamp: DateTime<Utc>,
    pub value: T,
}

/// Bounded, time-ordered buffer of sensor samples that can be queried at arbitrary timestamps.
///
/// Queries for a time after the newest sample wait (bounded by a timeout) for the
/// producer to catch up, so the returned value is the one valid at that time rather
/// than the latest cached one.
#[derive(Debug)]
pub struct TimedBuffer<T> {
    samples: RwLock<VecDeque<Stamped<T>>>,
    latest_stamp: watch::Sender<Option<DateTime<Utc>>>,
    capacity: usize,
    max_gap: TimeDelta,
}

impl<T: Interpolate> TimedBuffer<T> {
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Creates an empty buffer.
    ///
    /// # Arguments
    /// - `capacity`: Number of samples kept; the oldest is evicted first.
    /// - `max_gap`: Largest spacing of two samples that may still be interpolated between.
    pub fn new(capacity: usize, max_gap: TimeDelta) -> Self {
        let (latest_stamp, _) = watch::channel(None);
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            latest_stamp,
            capacity: capacity.max(2),
            max_gap,
        }
    }

    /// Appends a sample. Samples older than the newest buffered one are rejected.
    pub async fn push(&self, stamp: DateTime<Utc>, value: T) -> Result<(), SensorError> {
        let mut samples = self.samples.write().await;
        if samples.back().is_some_and(|last| stamp < last.stamp) {
            return Err(SensorError::OutOfOrder);
        }
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(Stamped { stamp, value });
        drop(samples);
        self.latest_stamp.send_replace(Some(stamp));
        Ok(())
    }

    /// Stamp of the newest sample, `None` while the buffer is empty.
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> { *self.latest_stamp.borrow() }

    /// Waits until at least one sample is buffered.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<DateTime<Utc>, SensorError> {
        self.wait_for_stamp(None, timeout).await
    }

    /// Waits until the newest sample is at or after `min_stamp` (any sample if `None`).
    pub async fn wait_for_stamp(
        &self,
        min_stamp: Option<DateTime<Utc>>,
        timeout: Duration,
    ) -> Result<DateTime<Utc>, SensorError> {
        let mut rx = self.latest_stamp.subscribe();
        let reached = |latest: &Option<DateTime<Utc>>| {
            latest.is_some_and(|stamp| min_stamp.is_none_or(|min| stamp >= min))
        };
        match tokio::time::timeout(timeout, rx.wait_for(reached)).await {
            Ok(Ok(latest)) => (*latest).ok_or(SensorError::NoData),
            Ok(Err(_)) => Err(SensorError::Closed),
            Err(_) => Err(SensorError::Timeout),
        }
    }

    /// Newest sample, waiting for the first one if the buffer is still empty.
    pub async fn latest(&self, timeout: Duration) -> Result<Stamped<T>, SensorError> {
        self.wait_until_ready(timeout).await?;
        self.samples.read().await.back().copied().ok_or(SensorError::NoData)
    }

    /// Value linearly interpolated at `time`.
    ///
    /// # Returns
    /// - `Err(SensorError::Timeout)`: no sample at or after `time` arrived within `timeout`.
    /// - `Err(SensorError::OutOfRange)`: `time` lies before the buffered history.
    /// - `Err(SensorError::Stale)`: the bracketing samples are further apart than allowed.
    pub async fn interpolated_at(&self, time: DateTime<Utc>, timeout: Duration) -> Result<T, SensorError> {
        self.wait_for_stamp(Some(time), timeout).await?;
        let samples = self.samples.read().await;
        let after_idx =
            samples.iter().position(|s| s.stamp >= time).ok_or(SensorError::NoData)?;
        let after = samples.get(after_idx).ok_or(SensorError::NoData)?;
        if after.stamp == time {
            return Ok(after.value);
        }
        let before = after_idx
            .checked_sub(1)
            .and_then(|i| samples.get(i))
            .ok_or(SensorError::OutOfRange)?;
        let gap = after.stamp - before.stamp;
        if gap > self.max_gap {
            return Err(SensorError::Stale);
        }
        let fraction = seconds(time - before.stamp) / seconds(gap);
        Ok(before.value.interpolate(&after.value, fraction))
    }
}
