use crate::dial::{DialLimits, SnapSettings};
use crate::rotator::InteractionAxis;
use crate::stereo::{GeometryMode, LockMode, UvRect};
use anyhow::{bail, Context, Result};
use glam::{UVec2, Vec2};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/xr.json";

pub const MIN_CYLINDER_ARC_DEGREES: f32 = 1.0;
pub const MAX_CYLINDER_ARC_DEGREES: f32 = 180.0;

/// How grip movement is replicated. Carried for the host framework; nothing here acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementReplication {
    KeepOriginalMovement,
    ForceServerSideMovement,
    #[default]
    ForceClientSideMovement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialConfig {
    #[serde(default = "DialConfig::default_dial_axis")]
    pub dial_rotation_axis: InteractionAxis,
    #[serde(default = "DialConfig::default_interactor_axis")]
    pub interactor_rotation_axis: InteractionAxis,
    #[serde(default)]
    pub snap_enabled: bool,
    #[serde(default = "DialConfig::default_snap_increment")]
    pub snap_increment: f32,
    #[serde(default)]
    pub snap_threshold: f32,
    #[serde(default = "DialConfig::default_limit")]
    pub clockwise_limit: f32,
    #[serde(default = "DialConfig::default_limit")]
    pub counter_clockwise_limit: f32,
    #[serde(default = "DialConfig::default_break_distance")]
    pub break_distance: f32,
    #[serde(default)]
    pub movement_replication: MovementReplication,
}

impl DialConfig {
    fn default_dial_axis() -> InteractionAxis {
        InteractionAxis::Z
    }

    fn default_interactor_axis() -> InteractionAxis {
        InteractionAxis::X
    }

    const fn default_snap_increment() -> f32 {
        45.0
    }

    const fn default_limit() -> f32 {
        180.0
    }

    const fn default_break_distance() -> f32 {
        100.0
    }

    pub fn limits(&self) -> DialLimits {
        DialLimits::new(self.clockwise_limit, self.counter_clockwise_limit)
    }

    pub fn snap_settings(&self) -> SnapSettings {
        SnapSettings { enabled: self.snap_enabled, increment: self.snap_increment, threshold: self.snap_threshold }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in
            [("clockwise_limit", self.clockwise_limit), ("counter_clockwise_limit", self.counter_clockwise_limit)]
        {
            if !(0.0..=360.0).contains(&value) {
                bail!("dial.{name} must be within [0, 360] degrees, got {value}");
            }
        }
        if !(self.break_distance >= 0.0) {
            bail!("dial.break_distance must not be negative, got {}", self.break_distance);
        }
        if self.snap_enabled && !(self.snap_increment > 0.0) {
            bail!("dial.snap_increment must be positive when snapping is enabled, got {}", self.snap_increment);
        }
        if !(self.snap_threshold >= 0.0) {
            bail!("dial.snap_threshold must not be negative, got {}", self.snap_threshold);
        }
        Ok(())
    }
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            dial_rotation_axis: Self::default_dial_axis(),
            interactor_rotation_axis: Self::default_interactor_axis(),
            snap_enabled: false,
            snap_increment: Self::default_snap_increment(),
            snap_threshold: 0.0,
            clockwise_limit: Self::default_limit(),
            counter_clockwise_limit: Self::default_limit(),
            break_distance: Self::default_break_distance(),
            movement_replication: MovementReplication::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StereoWidgetConfig {
    #[serde(default)]
    pub geometry_mode: GeometryMode,
    #[serde(default = "StereoWidgetConfig::default_arc_angle")]
    pub cylinder_arc_angle: f32,
    #[serde(default = "StereoWidgetConfig::default_draw_size")]
    pub draw_size: [u32; 2],
    #[serde(default = "StereoWidgetConfig::default_pivot")]
    pub pivot: [f32; 2],
    #[serde(default = "StereoWidgetConfig::default_quad_size")]
    pub quad_size: [f32; 2],
    #[serde(default = "StereoWidgetConfig::default_uv_min")]
    pub uv_min: [f32; 2],
    #[serde(default = "StereoWidgetConfig::default_uv_max")]
    pub uv_max: [f32; 2],
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub lock_mode: LockMode,
    #[serde(default)]
    pub supports_depth: bool,
    #[serde(default)]
    pub no_alpha_channel: bool,
    #[serde(default)]
    pub quad_preserve_texture_ratio: bool,
    #[serde(default = "StereoWidgetConfig::default_continuous_update")]
    pub continuous_update: bool,
}

impl StereoWidgetConfig {
    const fn default_arc_angle() -> f32 {
        180.0
    }

    const fn default_draw_size() -> [u32; 2] {
        [500, 500]
    }

    const fn default_pivot() -> [f32; 2] {
        [0.5, 0.5]
    }

    const fn default_quad_size() -> [f32; 2] {
        [500.0, 500.0]
    }

    const fn default_uv_min() -> [f32; 2] {
        [0.0, 0.0]
    }

    const fn default_uv_max() -> [f32; 2] {
        [1.0, 1.0]
    }

    const fn default_continuous_update() -> bool {
        true
    }

    pub fn draw_size(&self) -> UVec2 {
        UVec2::from_array(self.draw_size)
    }

    pub fn pivot(&self) -> Vec2 {
        Vec2::from_array(self.pivot)
    }

    pub fn quad_size(&self) -> Vec2 {
        Vec2::from_array(self.quad_size)
    }

    pub fn uv_rect(&self) -> UvRect {
        UvRect::new(Vec2::from_array(self.uv_min), Vec2::from_array(self.uv_max))
    }

    /// Rejects sizes that cannot be drawn and pulls the arc angle and pivot into range.
    pub fn validate(&mut self) -> Result<()> {
        if self.draw_size.contains(&0) {
            bail!("stereo_widget.draw_size must be non-zero, got {:?}", self.draw_size);
        }
        if self.quad_size.iter().any(|v| !(*v >= 0.0)) {
            bail!("stereo_widget.quad_size must not be negative, got {:?}", self.quad_size);
        }
        if !self.cylinder_arc_angle.is_finite() {
            bail!("stereo_widget.cylinder_arc_angle must be finite");
        }
        let clamped_arc = self.cylinder_arc_angle.clamp(MIN_CYLINDER_ARC_DEGREES, MAX_CYLINDER_ARC_DEGREES);
        if clamped_arc != self.cylinder_arc_angle {
            warn!(
                "[config] cylinder_arc_angle {} outside [{MIN_CYLINDER_ARC_DEGREES}, {MAX_CYLINDER_ARC_DEGREES}], using {clamped_arc}",
                self.cylinder_arc_angle
            );
            self.cylinder_arc_angle = clamped_arc;
        }
        for component in &mut self.pivot {
            if !component.is_finite() {
                bail!("stereo_widget.pivot must be finite");
            }
            *component = component.clamp(0.0, 1.0);
        }
        Ok(())
    }
}

impl Default for StereoWidgetConfig {
    fn default() -> Self {
        Self {
            geometry_mode: GeometryMode::default(),
            cylinder_arc_angle: Self::default_arc_angle(),
            draw_size: Self::default_draw_size(),
            pivot: Self::default_pivot(),
            quad_size: Self::default_quad_size(),
            uv_min: Self::default_uv_min(),
            uv_max: Self::default_uv_max(),
            priority: 0,
            lock_mode: LockMode::default(),
            supports_depth: false,
            no_alpha_channel: false,
            quad_preserve_texture_ratio: false,
            continuous_update: Self::default_continuous_update(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct XrConfig {
    #[serde(default)]
    pub dial: DialConfig,
    #[serde(default)]
    pub stereo_widget: StereoWidgetConfig,
}

#[derive(Debug, Clone, Default)]
pub struct XrConfigOverrides {
    pub clockwise_limit: Option<f32>,
    pub counter_clockwise_limit: Option<f32>,
    pub snap_increment: Option<f32>,
    pub snap_threshold: Option<f32>,
    pub break_distance: Option<f32>,
    pub geometry_mode: Option<GeometryMode>,
    pub cylinder_arc_angle: Option<f32>,
}

impl XrConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut cfg: XrConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.validate().with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn validate(&mut self) -> Result<()> {
        self.dial.validate()?;
        self.stereo_widget.validate()?;
        Ok(())
    }

    /// Applies CLI overrides and re-validates the result.
    pub fn apply_overrides(&mut self, overrides: &XrConfigOverrides) -> Result<()> {
        if let Some(limit) = overrides.clockwise_limit {
            self.dial.clockwise_limit = limit;
        }
        if let Some(limit) = overrides.counter_clockwise_limit {
            self.dial.counter_clockwise_limit = limit;
        }
        if let Some(increment) = overrides.snap_increment {
            self.dial.snap_enabled = true;
            self.dial.snap_increment = increment;
        }
        if let Some(threshold) = overrides.snap_threshold {
            self.dial.snap_threshold = threshold;
        }
        if let Some(distance) = overrides.break_distance {
            self.dial.break_distance = distance;
        }
        if let Some(mode) = overrides.geometry_mode {
            self.stereo_widget.geometry_mode = mode;
        }
        if let Some(arc) = overrides.cylinder_arc_angle {
            self.stereo_widget.cylinder_arc_angle = arc;
        }
        self.validate()
    }
}

impl XrConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.clockwise_limit.is_some() {
            fields.push("clockwise_limit");
        }
        if self.counter_clockwise_limit.is_some() {
            fields.push("counter_clockwise_limit");
        }
        if self.snap_increment.is_some() {
            fields.push("snap_increment");
        }
        if self.snap_threshold.is_some() {
            fields.push("snap_threshold");
        }
        if self.break_distance.is_some() {
            fields.push("break_distance");
        }
        if self.geometry_mode.is_some() {
            fields.push("geometry_mode");
        }
        if self.cylinder_arc_angle.is_some() {
            fields.push("cylinder_arc_angle");
        }
        fields
    }
}
