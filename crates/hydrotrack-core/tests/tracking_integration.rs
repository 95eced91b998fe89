//! Integration tests for the tracking engine driven by its real decay timer.
//!
//! Time is paused; `sleep` auto-advances the clock so every scheduled decay
//! tick before the wake-up deadline fires in order.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hydrotrack_core::status::RecordingSink;
use hydrotrack_core::tracker::DECAY_AMOUNT_ML;
use hydrotrack_core::{
    Command, CommandGateway, EngineSettings, Event, StatusPresenter, TrackingEngine,
    TrackingState,
};
use tokio::time;

const HALF_TICK: Duration = Duration::from_millis(2500);

fn ticks(n: u64) -> Duration {
    Duration::from_millis(5000 * n) + HALF_TICK
}

fn engine_with(level_ml: f64) -> (TrackingEngine, RecordingSink) {
    let probe = RecordingSink::new();
    let presenter = StatusPresenter::new("Hydration", Box::new(probe.clone()));
    let engine =
        TrackingEngine::with_level(level_ml, EngineSettings::default(), presenter).unwrap();
    (engine, probe)
}

fn after_ticks(initial: f64, n: u32) -> f64 {
    let mut level = initial;
    for _ in 0..n {
        level = (level - DECAY_AMOUNT_ML).max(0.0);
    }
    level
}

fn assert_level(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected level {expected}, got {actual}"
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_a_start_then_add() {
    let (engine, probe) = engine_with(0.0);
    engine.start();
    engine.add_water(250.0).unwrap();

    let snap = engine.query();
    assert_eq!(snap.level_ml, 250.0);
    assert!(snap.running);
    assert_eq!(probe.last().unwrap().text, "250.0 ml");
}

#[tokio::test(start_paused = true)]
async fn scenario_b_five_ticks_elapse() {
    let (engine, _) = engine_with(250.0);
    engine.start();

    time::sleep(ticks(5)).await;

    let snap = engine.query();
    assert_level(snap.level_ml, after_ticks(250.0, 5));
    assert!(snap.running);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_small_level_clamps_to_zero() {
    let (engine, probe) = engine_with(0.1);
    engine.start();

    time::sleep(ticks(1)).await;

    assert_eq!(engine.query().level_ml, 0.0);
    assert_eq!(probe.last().unwrap().text, "0.0 ml");
}

#[tokio::test(start_paused = true)]
async fn scenario_d_add_while_stopped() {
    let (engine, _) = engine_with(0.0);
    engine.stop();
    engine.add_water(250.0).unwrap();

    let snap = engine.query();
    assert_eq!(snap.level_ml, 250.0);
    assert!(!snap.running);
    assert_eq!(engine.armed_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_e_unavailable_channel_does_not_block_tracking() {
    let (engine, probe) = engine_with(0.0);
    probe.set_available(false);

    engine.start();
    assert!(engine.add_water(250.0).is_ok());
    time::sleep(ticks(2)).await;

    assert_level(engine.query().level_ml, after_ticks(250.0, 2));
    assert_eq!(probe.render_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_future_decay() {
    let (engine, _) = engine_with(250.0);
    engine.start();
    time::sleep(ticks(1)).await;
    engine.stop();

    time::sleep(ticks(20)).await;

    assert_level(engine.query().level_ml, after_ticks(250.0, 1));
    assert_eq!(engine.state(), TrackingState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn no_decay_before_start() {
    let (engine, _) = engine_with(100.0);
    time::sleep(ticks(10)).await;
    assert_eq!(engine.query().level_ml, 100.0);
}

#[tokio::test(start_paused = true)]
async fn double_start_keeps_single_cadence() {
    let (engine, _) = engine_with(250.0);
    engine.start();
    engine.start();
    assert_eq!(engine.armed_timers(), 1);

    time::sleep(ticks(3)).await;

    assert_level(engine.query().level_ml, after_ticks(250.0, 3));
}

#[tokio::test(start_paused = true)]
async fn restart_cycle_does_not_double_schedule() {
    let (engine, _) = engine_with(250.0);
    engine.start();
    engine.stop();
    engine.start();
    engine.stop();
    engine.start();
    assert_eq!(engine.armed_timers(), 1);

    time::sleep(ticks(2)).await;

    assert_level(engine.query().level_ml, after_ticks(250.0, 2));
}

#[tokio::test(start_paused = true)]
async fn configured_cadence_is_honoured() {
    let settings = EngineSettings {
        decay_interval: Duration::from_millis(1000),
        decay_amount_ml: 1.0,
        ..EngineSettings::default()
    };
    let engine = TrackingEngine::with_level(10.0, settings, StatusPresenter::disabled()).unwrap();
    engine.start();

    time::sleep(Duration::from_millis(4500)).await;

    assert_eq!(engine.query().level_ml, 6.0);
}

#[test]
fn invalid_settings_never_build_an_engine() {
    let settings = EngineSettings {
        decay_amount_ml: f64::NAN,
        ..EngineSettings::default()
    };
    assert!(TrackingEngine::with_level(10.0, settings, StatusPresenter::disabled()).is_err());

    let settings = EngineSettings {
        decay_interval: Duration::ZERO,
        ..EngineSettings::default()
    };
    assert!(TrackingEngine::with_level(10.0, settings, StatusPresenter::disabled()).is_err());
}

#[tokio::test(start_paused = true)]
async fn gateway_round_trip() {
    let (engine, probe) = engine_with(0.0);
    let gateway = CommandGateway::new(engine);

    let reply = gateway.handle("start").unwrap();
    assert!(matches!(reply.event, Some(Event::TrackingStarted { .. })));

    gateway.handle(r#"{"command":"add_water","amount":500}"#).unwrap();
    time::sleep(ticks(1)).await;

    let reply = gateway.dispatch(Command::Query).unwrap();
    assert_level(reply.snapshot.level_ml, after_ticks(500.0, 1));
    assert!(reply.snapshot.running);

    let reply = gateway.handle("stop").unwrap();
    assert!(matches!(reply.event, Some(Event::TrackingStopped { .. })));
    assert!(!gateway.query().running);
    assert_eq!(probe.withdrawals(), 1);
}

#[test]
fn concurrent_commands_do_not_lose_updates() {
    let engine = TrackingEngine::new(EngineSettings::default(), StatusPresenter::disabled()).unwrap();
    let gateway = Arc::new(CommandGateway::new(engine));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                for _ in 0..100 {
                    gateway.dispatch(Command::AddWater { amount: Some(1.0) }).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(gateway.query().level_ml, 800.0);
}
