use super::{Interpolate, SensorError, TimedBuffer};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }
}

impl Interpolate for Translation {
    fn interpolate(&self, other: &Self, fraction: f64) -> Self {
        Self {
            x: self.x.interpolate(&other.x, fraction),
            y: self.y.interpolate(&other.y, fraction),
            z: self.z.interpolate(&other.z, fraction),
        }
    }
}

/// Pose of `child` expressed in `parent` at `stamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTransform {
    pub stamp: DateTime<Utc>,
    pub parent: String,
    pub child: String,
    pub translation: Translation,
}

/// Resolves the pose of a named frame at a given time.
#[async_trait]
pub trait TransformLookup: Send + Sync {
    /// Looks up `parent -> child`.
    ///
    /// # Arguments
    /// - `time`: The instant the pose must be valid at, or `None` for the latest available pose.
    /// - `timeout`: Upper bound for waiting on the pose to become available.
    async fn transform_at(
        &self,
        parent: &str,
        child: &str,
        time: Option<DateTime<Utc>>,
        timeout: Duration,
    ) -> Result<StampedTransform, SensorError>;
}

/// Per frame pair history of published translations.
#[derive(Debug)]
pub struct TransformBuffer {
    frames: RwLock<HashMap<(String, String), Arc<TimedBuffer<Translation>>>>,
    capacity: usize,
    max_gap: TimeDelta,
}

impl TransformBuffer {
    pub fn new(capacity: usize, max_gap: TimeDelta) -> Self {
        Self { frames: RwLock::new(HashMap::new()), capacity, max_gap }
    }

    async fn frame_buffer(&self, parent: &str, child: &str) -> Arc<TimedBuffer<Translation>> {
        let key = (parent.to_string(), child.to_string());
        if let Some(buffer) = self.frames.read().await.get(&key) {
            return Arc::clone(buffer);
        }
        let mut frames = self.frames.write().await;
        let buffer = frames
            .entry(key)
            .or_insert_with(|| Arc::new(TimedBuffer::new(self.capacity, self.max_gap)));
        Arc::clone(buffer)
    }

    /// Records the pose of `child` in `parent` at `stamp`.
    pub async fn publish(
        &self,
        parent: &str,
        child: &str,
        stamp: DateTime<Utc>,
        translation: Translation,
    ) -> Result<(), SensorError> {
        self.frame_buffer(parent, child).await.push(stamp, translation).await
    }
}

#[async_trait]
impl TransformLookup for TransformBuffer {
    async fn transform_at(
        &self,
        parent: &str,
        child: &str,
        time: Option<DateTime<Utc>>,
        timeout: Duration,
    ) -> Result<StampedTransform, SensorError> {
        let buffer = self.frame_buffer(parent, child).await;
        let (stamp, translation) = match time {
            Some(t) => (t, buffer.interpolated_at(t, timeout).await?),
            None => {
                let latest = buffer.latest(timeout).await?;
                (latest.stamp, latest.value)
            }
        };
        Ok(StampedTransform {
            stamp,
            parent: parent.to_string(),
            child: child.to_string(),
            translation,
        })
    }
}
