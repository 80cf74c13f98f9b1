use crate::config::XrConfigOverrides;
use crate::stereo::GeometryMode;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

const SUPPORTED_FLAGS: &str = "--config, --cw-limit, --ccw-limit, --snap-increment, --snap-threshold, \
--break-distance, --geometry, --arc, --deltas";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config_path: Option<PathBuf>,
    clockwise_limit: Option<f32>,
    counter_clockwise_limit: Option<f32>,
    snap_increment: Option<f32>,
    snap_threshold: Option<f32>,
    break_distance: Option<f32>,
    geometry_mode: Option<GeometryMode>,
    cylinder_arc_angle: Option<f32>,
    deltas: Vec<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config_path = Some(PathBuf::from(value)),
                "cw-limit" => overrides.clockwise_limit = Some(parse_degrees("cw-limit", &value)?),
                "ccw-limit" => overrides.counter_clockwise_limit = Some(parse_degrees("ccw-limit", &value)?),
                "snap-increment" => overrides.snap_increment = Some(parse_degrees("snap-increment", &value)?),
                "snap-threshold" => overrides.snap_threshold = Some(parse_degrees("snap-threshold", &value)?),
                "break-distance" => {
                    overrides.break_distance =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid break-distance '{value}'"))?);
                }
                "geometry" => overrides.geometry_mode = Some(parse_geometry(&value)?),
                "arc" => overrides.cylinder_arc_angle = Some(parse_degrees("arc", &value)?),
                "deltas" => overrides.deltas = parse_deltas(&value)?,
                _ => bail!("Unknown flag '{flag}'. Supported flags: {SUPPORTED_FLAGS}."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    /// Per-tick interactor rotation deltas, in degrees.
    pub fn deltas(&self) -> &[f32] {
        &self.deltas
    }

    pub fn into_config_overrides(self) -> XrConfigOverrides {
        XrConfigOverrides {
            clockwise_limit: self.clockwise_limit,
            counter_clockwise_limit: self.counter_clockwise_limit,
            snap_increment: self.snap_increment,
            snap_threshold: self.snap_threshold,
            break_distance: self.break_distance,
            geometry_mode: self.geometry_mode,
            cylinder_arc_angle: self.cylinder_arc_angle,
        }
    }
}

fn parse_degrees(flag: &str, value: &str) -> Result<f32> {
    let degrees = value.parse::<f32>().with_context(|| format!("Invalid {flag} '{value}'"))?;
    if !degrees.is_finite() {
        bail!("Invalid {flag} '{value}'. Expected a finite angle in degrees.");
    }
    Ok(degrees)
}

fn parse_geometry(value: &str) -> Result<GeometryMode> {
    match value.to_ascii_lowercase().as_str() {
        "plane" | "quad" => Ok(GeometryMode::Plane),
        "cylinder" => Ok(GeometryMode::Cylinder),
        other => bail!("Invalid geometry '{other}'. Use plane or cylinder."),
    }
}

fn parse_deltas(value: &str) -> Result<Vec<f32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_degrees("deltas", part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dial_flags_and_deltas() {
        let args = ["dial_trace", "--cw-limit", "90", "--ccw-limit", "90", "--deltas", "30, -50,200"];
        let cli = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(cli.deltas(), &[30.0, -50.0, 200.0]);
        let overrides = cli.into_config_overrides();
        assert_eq!(overrides.clockwise_limit, Some(90.0));
        assert_eq!(overrides.counter_clockwise_limit, Some(90.0));
        assert_eq!(overrides.applied_fields(), vec!["clockwise_limit", "counter_clockwise_limit"]);
    }

    #[test]
    fn parses_geometry_and_config_path() {
        let args = ["surface_mesh", "--geometry", "Cylinder", "--arc", "120", "--config", "cfg/xr.json"];
        let cli = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(cli.config_path(), Some(&PathBuf::from("cfg/xr.json")));
        let overrides = cli.into_config_overrides();
        assert_eq!(overrides.geometry_mode, Some(GeometryMode::Cylinder));
        assert_eq!(overrides.cylinder_arc_angle, Some(120.0));
    }

    #[test]
    fn latest_flag_wins() {
        let cli = CliOverrides::parse(["app", "--arc", "30", "--arc", "60"]).expect("parse overrides");
        assert_eq!(cli.into_config_overrides().cylinder_arc_angle, Some(60.0));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--cw-limit"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_numbers() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["app", "--deltas", "10,abc"]).is_err());
        assert!(CliOverrides::parse(["app", "--geometry", "sphere"]).is_err());
        assert!(CliOverrides::parse(["app", "--arc", "inf"]).is_err());
    }
}
