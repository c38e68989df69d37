use chrono::{DateTime, TimeDelta, Utc};

/// Converts a time delta to fractional seconds with microsecond resolution.
#[allow(clippy::cast_precision_loss)]
pub fn seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Most recent of the given timestamps, ignoring missing ones.
pub fn latest_stamp<I>(stamps: I) -> Option<DateTime<Utc>>
where I: IntoIterator<Item = Option<DateTime<Utc>>> {
    stamps.into_iter().flatten().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_seconds() {
        assert!((seconds(TimeDelta::milliseconds(1500)) - 1.5).abs() < 1e-12);
        assert!((seconds(TimeDelta::microseconds(-250)) + 0.00025).abs() < 1e-12);
    }

    #[test]
    fn latest_of_optional_stamps() {
        let t0 = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let t1 = t0 + TimeDelta::seconds(3);
        assert_eq!(latest_stamp([Some(t0), None, Some(t1)]), Some(t1));
        assert_eq!(latest_stamp([None, None]), None);
    }
}
