use anyhow::{bail, Result};
use kestrel_xr::cli::CliOverrides;
use kestrel_xr::config::{XrConfig, DEFAULT_CONFIG_PATH};
use kestrel_xr::stereo::{project_surface, SurfaceParams};
use log::info;
use serde_json::json;
use std::process;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("surface_mesh error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliOverrides::parse_from_env()?;
    let path = cli.config_path().cloned().unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    let mut config = XrConfig::load_or_default(&path);
    config.apply_overrides(&cli.into_config_overrides())?;

    let widget = &config.stereo_widget;
    let params = SurfaceParams {
        size: widget.draw_size().as_vec2(),
        pivot: widget.pivot(),
        geometry_mode: widget.geometry_mode,
        arc_angle_radians: widget.cylinder_arc_angle.to_radians(),
    };
    let surface = project_surface(&params);
    if surface.is_empty() {
        bail!("surface for {:?} is degenerate", params.geometry_mode);
    }
    let bounds = surface.bounds();
    info!(
        "[stereo] projected {:?} surface: {} vertices, {} triangles",
        params.geometry_mode,
        surface.vertices.len(),
        surface.triangle_count()
    );

    let report = json!({
        "geometry_mode": params.geometry_mode,
        "size": params.size.to_array(),
        "pivot": params.pivot.to_array(),
        "arc_angle_degrees": widget.cylinder_arc_angle,
        "bounds": { "min": bounds.min.to_array(), "max": bounds.max.to_array(), "radius": bounds.radius },
        "vertices": surface.vertices,
        "indices": surface.indices,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
