use chrono::Utc;
use std::{env, time::Duration};
use takeoff_sequencer::config::{RampStrategy, TakeoffConfig};
use takeoff_sequencer::flight_control::{Attitude, TakeoffController};
use takeoff_sequencer::sim::{SimParams, SimVehicle};
use takeoff_sequencer::{fatal, info, log, warn};
use tokio::time::MissedTickBehavior;

const CONTROL_PERIOD: Duration = Duration::from_millis(20);
const MAX_CYCLES: usize = 1500;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let config = config_from_env();
    let params = SimParams::default();
    // the switch release ramp expects motors that are already armed
    let armed = matches!(config.strategy, RampStrategy::SwitchRelease { .. });
    let (sim, sensors) =
        SimVehicle::new(params, &config, armed).unwrap_or_else(|e| fatal!("Invalid configuration: {e}"));
    let model = params.thrust_model(&config);
    let mut ctrl = TakeoffController::new(config, model, sensors)
        .unwrap_or_else(|e| fatal!("Failed to create takeoff controller: {e}"));

    if let Err(e) = sim.tick(Utc::now()).await {
        fatal!("Simulation failed to publish initial state: {e}");
    }
    if let Err(e) = ctrl.wait_until_ready(config.startup_timeout).await {
        fatal!("Takeoff controller not ready: {e}");
    }
    if let Err(e) = ctrl.prepare_for_takeover(Utc::now()) {
        fatal!("Failed to prepare takeoff: {e}");
    }

    let mut interval = tokio::time::interval(CONTROL_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    for _ in 0..MAX_CYCLES {
        interval.tick().await;
        let now = Utc::now();
        if let Err(e) = sim.tick(now).await {
            warn!("Simulation skipped a cycle: {e}");
            continue;
        }
        match ctrl.update(now, Attitude::level()).await {
            Ok(command) => sim.apply(&command).await,
            Err(e) if e.is_fatal() => {
                ctrl.abort();
                break;
            }
            Err(e) => warn!("Takeoff update failed ({}): {e}", e.kind()),
        }
        if ctrl.is_done() {
            break;
        }
    }

    match ctrl.hover_throttle() {
        Some(hover) if ctrl.is_done() => {
            info!("Takeoff finished at hover throttle {hover:.4}, gear {:.3}m above ground", sim.height().await);
        }
        _ => warn!("Takeoff did not reach a hover throttle"),
    }
    let model = ctrl.into_thrust_model();
    info!("Thrust model scale factor after takeoff: {:.4}", model.thrust_scale_factor());
    sim.shutdown();
}

/// Builds the configuration from defaults and the `TAKEOFF_*` environment overrides.
fn config_from_env() -> TakeoffConfig {
    let seconds = |key: &str| {
        env::var(key).ok().and_then(|v| v.parse::<f64>().ok()).and_then(|s| Duration::try_from_secs_f64(s).ok())
    };
    let mut strategy = match env::var("TAKEOFF_STRATEGY").as_deref() {
        Ok("switch_release") => RampStrategy::switch_release(),
        Ok("timed_hover") | Err(_) => RampStrategy::timed_hover(),
        Ok(other) => {
            warn!("Unknown takeoff strategy {other}, using timed hover");
            RampStrategy::timed_hover()
        }
    };
    match &mut strategy {
        RampStrategy::TimedHover { post_arm_delay, ramp_duration } => {
            if let Some(delay) = seconds("TAKEOFF_POST_ARM_DELAY") {
                *post_arm_delay = delay;
            }
            if let Some(duration) = seconds("TAKEOFF_RAMP_DURATION") {
                *ramp_duration = duration;
            }
        }
        RampStrategy::SwitchRelease { ramp_rate, .. } => {
            if let Some(rate) = env::var("TAKEOFF_RAMP_RATE").ok().and_then(|v| v.parse().ok()) {
                *ramp_rate = rate;
            }
        }
    }
    log!("Using {} strategy", strategy.name());
    TakeoffConfig::new(strategy)
}
