use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use bevy::math::{DVec2, DVec3};
use clap::{Parser, ValueEnum};
use corridor_core::{
    build_terrain, load_corridor_config_from_env, CatmullRomCurve, CenterlineSource,
    CorridorConfig, CorridorEditor, EditReport, GridMetadata, HeightGrid, MemoryGridStorage,
    TerrainSettings, WrittenArea,
};
use serde_json::{json, Value as JsonValue};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Carve,
    Blend,
    Smooth,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs corridor edits on synthetic terrain", long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Carve)]
    mode: Mode,

    /// Corridor config JSON (defaults to CORRIDOR_CONFIG_PATH, then the builtin copy)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid resolution in cells per side
    #[arg(long, default_value_t = 129)]
    resolution: usize,

    /// Footprint side length in meters
    #[arg(long, default_value_t = 256.0)]
    extent: f64,

    /// Vertical size in meters
    #[arg(long, default_value_t = 60.0)]
    vertical: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Linear drop along +x applied to the synthetic terrain
    #[arg(long, default_value_t = 1.5)]
    tilt: f64,

    /// Curve control point as `x,z` in world meters; repeat for more points
    #[arg(long = "point")]
    points: Vec<String>,

    /// Trace start as `x,z`; used when no curve points are given
    #[arg(long)]
    start: Option<String>,

    /// Write the edited heights as a JSON array
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => CorridorConfig::from_file(path)
            .with_context(|| format!("Failed to load corridor config {}", path.display()))?,
        None => (*load_corridor_config_from_env().0).clone(),
    };
    let editor = CorridorEditor::new(&config).context("Corridor config rejected")?;

    let metadata = GridMetadata::new(
        args.resolution,
        DVec2::ZERO,
        DVec3::new(args.extent, args.vertical, args.extent),
    )
    .context("Invalid grid dimensions")?;
    let baseline = build_terrain(
        metadata,
        &TerrainSettings {
            seed: args.seed,
            tilt: args.tilt,
            ..TerrainSettings::default()
        },
    );
    let mut storage = MemoryGridStorage::new(baseline.clone());

    let curve = if args.points.is_empty() {
        None
    } else {
        let points = args
            .points
            .iter()
            .map(|raw| parse_xz(raw).map(|p| DVec3::new(p.x, 0.0, p.y)))
            .collect::<Result<Vec<_>>>()?;
        Some(CatmullRomCurve::new(points).context("Invalid curve control points")?)
    };
    let source = match (&curve, &args.start) {
        (Some(curve), _) => CenterlineSource::Curve(curve),
        (None, Some(start)) => CenterlineSource::Trace {
            start: parse_xz(start)?,
        },
        (None, None) => CenterlineSource::Trace {
            start: DVec2::splat(args.extent * 0.25),
        },
    };

    let report = match args.mode {
        Mode::Carve => editor.apply_carve(&mut storage, &baseline, source)?,
        Mode::Blend => {
            let eroded = eroded_target(&baseline);
            editor.apply_blend(&mut storage, &baseline, &eroded, source)?
        }
        Mode::Smooth => {
            let stamp = {
                let centerline = editor.resolve_centerline(&baseline, source)?;
                editor.build_corridor(&metadata, &centerline)
            };
            let region = (!stamp.region.is_empty()).then_some(stamp.region);
            editor.apply_smooth(&mut storage, region.as_ref())?
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report_json(&args, &report, &baseline, storage.grid()))?
    );

    if let Some(path) = &args.dump {
        let heights = serde_json::to_string(storage.grid().heights())?;
        fs::write(path, heights)
            .with_context(|| format!("Failed to write heights to {}", path.display()))?;
    }

    Ok(())
}

fn parse_xz(raw: &str) -> Result<DVec2> {
    let (x, z) = raw
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Expected `x,z`, got '{}'", raw))?;
    let x: f64 = x.trim().parse().with_context(|| format!("Bad x in '{}'", raw))?;
    let z: f64 = z.trim().parse().with_context(|| format!("Bad z in '{}'", raw))?;
    if !x.is_finite() || !z.is_finite() {
        bail!("Coordinates must be finite: '{}'", raw);
    }
    Ok(DVec2::new(x, z))
}

/// Baseline with a shallow box-blurred dip, standing in for an erosion pass.
fn eroded_target(baseline: &HeightGrid) -> HeightGrid {
    HeightGrid::from_fn(baseline.metadata(), |x, z| {
        let (x, z) = (x as i64, z as i64);
        let mut sum = 0.0;
        for dz in -2..=2 {
            for dx in -2..=2 {
                sum += baseline.get(x + dx, z + dz);
            }
        }
        (sum / 25.0 - 0.05).max(0.0)
    })
}

fn report_json(
    args: &Args,
    report: &EditReport,
    before: &HeightGrid,
    after: &HeightGrid,
) -> JsonValue {
    let max_drop = before
        .heights()
        .iter()
        .zip(after.heights())
        .map(|(b, a)| (b - a).max(0.0))
        .fold(0.0f32, f32::max);
    let area = report.write.map(|write| match write.area {
        WrittenArea::Region(_) => "region",
        WrittenArea::Full => "full",
    });
    json!({
        "mode": format!("{:?}", args.mode).to_lowercase(),
        "resolution": args.resolution,
        "samples": report.samples,
        "region": if report.region.is_empty() {
            JsonValue::Null
        } else {
            json!({
                "min_x": report.region.min_x,
                "min_z": report.region.min_z,
                "max_x": report.region.max_x,
                "max_z": report.region.max_z,
            })
        },
        "trace": report.trace.map(|trace| json!({
            "steps": trace.steps,
            "raw_points": trace.raw_points,
            "traveled_meters": trace.traveled_meters,
            "termination": format!("{:?}", trace.termination),
        })),
        "write": report.write.map(|write| json!({
            "area": area,
            "cells": write.cells_written,
            "changed": write.changed,
        })),
        "max_drop_meters": max_drop as f64 * before.metadata().vertical_size(),
    })
}
