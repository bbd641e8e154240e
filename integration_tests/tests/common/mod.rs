use std::path::PathBuf;
use std::sync::Once;

use bevy::math::{DVec2, DVec3};
use corridor_core::{build_terrain, GridMetadata, HeightGrid, TerrainSettings};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_corridor_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test corridor config at {}",
            config_path.display()
        );

        std::env::set_var("CORRIDOR_CONFIG_PATH", &config_path);
    });
}

#[allow(dead_code)]
pub fn grid_metadata(resolution: usize) -> GridMetadata {
    let extent = (resolution - 1) as f64;
    GridMetadata::new(resolution, DVec2::ZERO, DVec3::new(extent, 40.0, extent))
        .expect("valid test grid")
}

#[allow(dead_code)]
pub fn sloped_terrain(resolution: usize, seed: u64) -> HeightGrid {
    build_terrain(
        grid_metadata(resolution),
        &TerrainSettings {
            seed,
            tilt: 2.5,
            ..TerrainSettings::default()
        },
    )
}
