use kestrel_xr::config::{MovementReplication, XrConfig, XrConfigOverrides};
use kestrel_xr::rotator::InteractionAxis;
use kestrel_xr::stereo::{GeometryMode, LockMode};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn full_config_file_round_trips_into_components() {
    let mut temp = NamedTempFile::new().expect("temp xr config");
    write!(
        temp,
        r#"{{
            "dial": {{
                "dial_rotation_axis": "y",
                "interactor_rotation_axis": "z",
                "snap_enabled": true,
                "snap_increment": 30.0,
                "snap_threshold": 4.0,
                "clockwise_limit": 120.0,
                "counter_clockwise_limit": 0.0,
                "break_distance": 25.0,
                "movement_replication": "force_server_side_movement"
            }},
            "stereo_widget": {{
                "geometry_mode": "cylinder",
                "cylinder_arc_angle": 200.0,
                "draw_size": [1024, 512],
                "pivot": [0.5, 1.5],
                "priority": 2,
                "lock_mode": "world_locked",
                "supports_depth": true
            }}
        }}"#
    )
    .expect("write xr config");

    let cfg = XrConfig::load(temp.path()).expect("load xr config");
    assert_eq!(cfg.dial.dial_rotation_axis, InteractionAxis::Y);
    assert_eq!(cfg.dial.interactor_rotation_axis, InteractionAxis::Z);
    assert_eq!(cfg.dial.limits().forbidden_arc(), Some((120.0, 360.0)));
    assert_eq!(cfg.dial.snap_settings().threshold, 4.0);
    assert_eq!(cfg.dial.movement_replication, MovementReplication::ForceServerSideMovement);

    let widget = &cfg.stereo_widget;
    assert_eq!(widget.geometry_mode, GeometryMode::Cylinder);
    assert_eq!(widget.cylinder_arc_angle, 180.0, "arc clamped on load");
    assert_eq!(widget.pivot, [0.5, 1.0], "pivot clamped on load");
    assert_eq!(widget.lock_mode, LockMode::WorldLocked);
    assert!(widget.supports_depth);
    assert!(widget.continuous_update, "unspecified flags keep their defaults");
}

#[test]
fn invalid_values_name_the_file() {
    let mut temp = NamedTempFile::new().expect("temp xr config");
    write!(temp, r#"{{"dial":{{"break_distance":-3.0}}}}"#).expect("write xr config");
    let err = XrConfig::load(temp.path()).unwrap_err();
    let message = format!("{err:?}");
    assert!(message.contains("Invalid config file"), "context names the file: {message}");
    assert!(message.contains("break_distance"), "cause names the field: {message}");
}

#[test]
fn malformed_json_is_a_parse_error() {
    let mut temp = NamedTempFile::new().expect("temp xr config");
    write!(temp, "{{ not json").expect("write xr config");
    let err = XrConfig::load(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().expect("temp dir");
    let cfg = XrConfig::load_or_default(dir.path().join("absent.json"));
    assert_eq!(cfg.dial.clockwise_limit, 180.0);
    assert_eq!(cfg.stereo_widget.draw_size, [500, 500]);
    assert!(XrConfig::load(dir.path().join("absent.json")).is_err());
}

#[test]
fn overrides_apply_on_top_of_file_values() {
    let mut temp = NamedTempFile::new().expect("temp xr config");
    write!(temp, r#"{{"dial":{{"clockwise_limit":45.0}}}}"#).expect("write xr config");
    let mut cfg = XrConfig::load(temp.path()).expect("load xr config");

    let overrides = XrConfigOverrides {
        counter_clockwise_limit: Some(90.0),
        geometry_mode: Some(GeometryMode::Cylinder),
        cylinder_arc_angle: Some(0.0),
        ..Default::default()
    };
    cfg.apply_overrides(&overrides).expect("apply overrides");
    assert_eq!(cfg.dial.clockwise_limit, 45.0);
    assert_eq!(cfg.dial.limits().forbidden_arc(), Some((45.0, 270.0)));
    assert_eq!(cfg.stereo_widget.cylinder_arc_angle, 1.0);

    let rejected = XrConfigOverrides { clockwise_limit: Some(400.0), ..Default::default() };
    assert!(cfg.apply_overrides(&rejected).is_err());
}
