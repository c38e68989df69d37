use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;

/// State of the four landing gear contact switches. `true` means pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LandingGear {
    pub front: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl LandingGear {
    pub fn all_pressed() -> Self { Self { front: true, back: true, left: true, right: true } }

    pub fn all_released() -> Self { Self::default() }

    fn switches(self) -> [bool; 4] { [self.front, self.back, self.left, self.right] }
}

/// Ground-contact indication, either a single landing detector flag or the
/// discrete landing gear switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GroundContact {
    LandingDetected(bool),
    Switches(LandingGear),
}

impl GroundContact {
    /// Vehicle is fully resting on the ground: flag set or every switch pressed.
    pub fn is_engaged(&self) -> bool {
        match self {
            GroundContact::LandingDetected(landed) => *landed,
            GroundContact::Switches(gear) => gear.switches().iter().all(|s| *s),
        }
    }

    /// Vehicle has left the ground: flag cleared or no switch pressed.
    pub fn is_released(&self) -> bool {
        match self {
            GroundContact::LandingDetected(landed) => !*landed,
            GroundContact::Switches(gear) => gear.switches().iter().all(|s| !*s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroundContactReading {
    pub stamp: DateTime<Utc>,
    pub contact: GroundContact,
}

impl GroundContactReading {
    pub fn new(stamp: DateTime<Utc>, contact: GroundContact) -> Self { Self { stamp, contact } }
}

/// Creates the producer/consumer pair for ground-contact messages.
///
/// The monitor starts without a reading; it is only trusted once the feed has
/// published at least once.
pub fn channel() -> (ContactFeed, ContactMonitor) {
    let (tx, rx) = watch::channel(None);
    (ContactFeed { tx }, ContactMonitor { rx })
}

/// Message-callback side. Publishing replaces the cached reading and never blocks.
#[derive(Debug, Clone)]
pub struct ContactFeed {
    tx: watch::Sender<Option<GroundContactReading>>,
}

impl ContactFeed {
    pub fn publish(&self, reading: GroundContactReading) { self.tx.send_replace(Some(reading)); }
}

/// Control-loop side holding the latest observed reading.
#[derive(Debug, Clone)]
pub struct ContactMonitor {
    rx: watch::Receiver<Option<GroundContactReading>>,
}

impl ContactMonitor {
    /// Latest reading, `None` while nothing has been received.
    pub fn latest(&self) -> Option<GroundContactReading> { *self.rx.borrow() }

    /// Waits until the first reading is received or `timeout` elapses.
    ///
    /// # Returns
    /// - `Some(GroundContactReading)`: the reading available when the wait ended.
    /// - `None`: no reading arrived in time, or the feed was dropped without publishing.
    pub async fn wait_first(&mut self, timeout: Duration) -> Option<GroundContactReading> {
        match tokio::time::timeout(timeout, self.rx.wait_for(Option::is_some)).await {
            Ok(Ok(reading)) => *reading,
            Ok(Err(_)) | Err(_) => None,
        }
    }
}
