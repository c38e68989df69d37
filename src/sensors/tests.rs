use super::*;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

fn t0() -> DateTime<Utc> { DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() }

fn at(secs: f64) -> DateTime<Utc> {
    #[allow(clippy::cast_possible_truncation)]
    let us = (secs * 1_000_000.0).round() as i64;
    t0() + TimeDelta::microseconds(us)
}

#[tokio::test]
async fn buffer_interpolates_between_samples() {
    let buffer = TimedBuffer::new(10, TimeDelta::seconds(1));
    buffer.push(at(0.0), 12.0).await.unwrap();
    buffer.push(at(0.5), 11.0).await.unwrap();
    let v = buffer.interpolated_at(at(0.25), Duration::from_millis(10)).await.unwrap();
    assert!((v - 11.5).abs() < 1e-9);
    let exact = buffer.interpolated_at(at(0.5), Duration::from_millis(10)).await.unwrap();
    assert!((exact - 11.0).abs() < f64::EPSILON);
    assert_eq!(buffer.last_update_time(), Some(at(0.5)));
}

#[tokio::test]
async fn buffer_rejects_bad_queries() {
    let buffer = TimedBuffer::new(10, TimeDelta::milliseconds(200));
    buffer.push(at(1.0), 12.0).await.unwrap();
    buffer.push(at(2.0), 11.0).await.unwrap();
    assert_eq!(buffer.push(at(1.5), 10.0).await, Err(SensorError::OutOfOrder));
    assert_eq!(
        buffer.interpolated_at(at(1.5), Duration::from_millis(10)).await,
        Err(SensorError::Stale)
    );
    assert_eq!(
        buffer.interpolated_at(at(0.5), Duration::from_millis(10)).await,
        Err(SensorError::OutOfRange)
    );
}

#[tokio::test(start_paused = true)]
async fn buffer_times_out_waiting_for_future_sample() {
    let buffer = TimedBuffer::new(10, TimeDelta::seconds(1));
    buffer.push(at(0.0), 12.0).await.unwrap();
    let start = tokio::time::Instant::now();
    let res = buffer.interpolated_at(at(0.1), Duration::from_millis(100)).await;
    assert_eq!(res, Err(SensorError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn buffer_evicts_oldest_sample() {
    let buffer = TimedBuffer::new(2, TimeDelta::seconds(5));
    for (i, v) in [10.0, 11.0, 12.0].into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        buffer.push(at(i as f64), v).await.unwrap();
    }
    assert_eq!(
        buffer.interpolated_at(at(0.5), Duration::from_millis(10)).await,
        Err(SensorError::OutOfRange)
    );
    let latest = buffer.latest(Duration::from_millis(10)).await.unwrap();
    assert_eq!(latest, Stamped { stamp: at(2.0), value: 12.0 });
}

#[tokio::test]
async fn transform_lookup_waits_for_publisher() {
    let transforms = std::sync::Arc::new(TransformBuffer::new(10, TimeDelta::seconds(1)));
    transforms.publish("map", "center_of_lift", at(0.0), Translation::new(0.0, 0.0, 0.1)).await.unwrap();
    let publisher = std::sync::Arc::clone(&transforms);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish("map", "center_of_lift", at(1.0), Translation::new(0.0, 0.0, 0.5)).await.unwrap();
    });
    let tf = transforms
        .transform_at("map", "center_of_lift", Some(at(0.5)), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(tf.stamp, at(0.5));
    assert!((tf.translation.z - 0.3).abs() < 1e-9);

    let latest = transforms.transform_at("map", "center_of_lift", None, Duration::from_secs(1)).await.unwrap();
    assert_eq!(latest.stamp, at(1.0));
    assert_eq!(latest.child, "center_of_lift");
}

#[tokio::test(start_paused = true)]
async fn transform_lookup_unknown_frame_times_out() {
    let transforms = TransformBuffer::new(10, TimeDelta::seconds(1));
    let res = transforms.transform_at("map", "base_footprint", None, Duration::from_millis(50)).await;
    assert_eq!(res, Err(SensorError::Timeout));
}

#[tokio::test]
async fn battery_interpolator_reports_readiness() {
    let battery = BatteryInterpolator::new(Duration::from_millis(50), TimeDelta::milliseconds(500));
    assert_eq!(battery.last_update_time(), None);
    battery.push(at(0.0), 12.4).await.unwrap();
    battery.wait_until_ready(Duration::from_millis(10)).await.unwrap();
    battery.push(at(0.1), 12.2).await.unwrap();
    let v = battery.interpolated_at(at(0.05)).await.unwrap();
    assert!((v - 12.3).abs() < 1e-9);
    assert_eq!(battery.last_update_time(), Some(at(0.1)));
}

#[tokio::test]
async fn arming_round_trip() {
    let (client, mut server) = arming::channel(Duration::from_secs(1));
    tokio::spawn(async move {
        while let Some(req) = server.next_request().await {
            if req.arm() {
                req.respond(ArmResponse::accepted());
            } else {
                req.respond(ArmResponse::rejected("disarm refused"));
            }
        }
    });
    assert!(client.request_arm(true).await.unwrap().success);
    let refused = client.request_arm(false).await.unwrap();
    assert!(!refused.success);
    assert_eq!(refused.message, "disarm refused");
}

#[tokio::test]
async fn arming_without_service_fails() {
    let (client, server) = arming::channel(Duration::from_millis(50));
    drop(server);
    assert_eq!(client.request_arm(true).await, Err(ArmingError::ServiceUnavailable));
}

#[tokio::test(start_paused = true)]
async fn arming_silent_service_times_out() {
    let (client, _server) = arming::channel(Duration::from_millis(50));
    assert_eq!(client.request_arm(true).await, Err(ArmingError::Timeout));
}
