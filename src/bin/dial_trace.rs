use anyhow::Result;
use bevy_ecs::prelude::Entity;
use kestrel_xr::cli::CliOverrides;
use kestrel_xr::config::{XrConfig, DEFAULT_CONFIG_PATH};
use kestrel_xr::dial::{DialComponent, GripController, GripTick, InteractorSample};
use kestrel_xr::rotator::Rotator;
use kestrel_xr::{normalize_axis, Transform3D};
use log::info;
use serde::Serialize;
use std::process;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("dial_trace error: {err:?}");
        process::exit(1);
    }
}

/// Local hand that always owns the grip.
struct TraceController;

impl GripController for TraceController {
    fn has_grip_authority(&self) -> bool {
        true
    }

    fn drop_object(&mut self) {}
}

#[derive(Serialize)]
struct TraceRow {
    tick: usize,
    delta: f32,
    backend_angle: f32,
    dial_angle: f32,
    snapped: bool,
    snap_reached: Option<f32>,
}

#[derive(Serialize)]
struct TraceReport {
    clockwise_limit: f32,
    counter_clockwise_limit: f32,
    ticks: Vec<TraceRow>,
    released_angle: f32,
}

fn run() -> Result<()> {
    let cli = CliOverrides::parse_from_env()?;
    let path = cli.config_path().cloned().unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    let deltas = cli.deltas().to_vec();
    let mut config = XrConfig::load_or_default(&path);
    config.apply_overrides(&cli.into_config_overrides())?;

    let axis = config.dial.interactor_rotation_axis;
    let mut dial = DialComponent::new(&config.dial);
    let mut controller = TraceController;
    let mut roll = 0.0_f32;
    let sample = |value: f32| InteractorSample::new(Transform3D::IDENTITY, Rotator::ZERO.with_axis_value(axis, value));

    dial.on_grip(Entity::from_raw(1), &sample(roll));
    let mut ticks = Vec::with_capacity(deltas.len());
    for (tick, delta) in deltas.into_iter().enumerate() {
        // Controller samples arrive wrapped, so a single step travels at most half a turn.
        roll = normalize_axis(roll + delta);
        match dial.tick_grip(&mut controller, &sample(roll)) {
            GripTick::Advanced(update) => ticks.push(TraceRow {
                tick,
                delta,
                backend_angle: update.backend_angle,
                dial_angle: update.dial_angle,
                snapped: update.snapped,
                snap_reached: update.snap_reached,
            }),
            GripTick::Dropped { distance } => {
                info!("[dial] trace dropped at tick {tick} after moving {distance:.2}");
                break;
            }
            GripTick::Ignored => break,
        }
    }
    let released_angle = dial.on_grip_release();

    let report = TraceReport {
        clockwise_limit: config.dial.clockwise_limit,
        counter_clockwise_limit: config.dial.counter_clockwise_limit,
        ticks,
        released_angle,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
