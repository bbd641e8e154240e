//! Heightmap corridor editing engine.
//!
//! Turns a world-space centerline, taken from a curve or traced down the
//! terrain, into a per-cell corridor mask and applies carve, blend or smooth
//! transforms weighted by it. Edits track the dirty cell rectangle so hosts
//! only write back the part of the grid that changed.

pub mod centerline;
pub mod config;
pub mod curve;
pub mod edit;
pub mod error;
pub mod grid;
pub mod mapper;
pub mod mask;
pub mod noise;
pub mod profile;
pub mod region;
pub mod smoothing;
pub mod storage;
pub mod synthetic;
pub mod trace;
pub mod transform;

pub use centerline::{Centerline, CenterlineSource, PathSample};
pub use config::{
    load_corridor_config_from_env, BlendConfig, CarveConfig, CorridorConfig,
    CorridorConfigError, CorridorConfigHandle, CorridorConfigMetadata, CorridorShapeConfig,
    EdgeJitterConfig, SamplingConfig, SmoothConfig, TraceConfig, WriteBackConfig,
    BUILTIN_CORRIDOR_CONFIG, CORRIDOR_CONFIG_ENV,
};
pub use curve::{CatmullRomCurve, CurveBackend, PolylineCurve};
pub use edit::{CorridorEdit, CorridorEditor, EditReport};
pub use error::{CorridorError, CorridorResult};
pub use grid::{HeightGrid, SurfaceSampler};
pub use mapper::{GridMapper, GridMetadata};
pub use mask::{CarveDepthField, CorridorMask, CorridorStamp, MaskBuilder};
pub use profile::{ProfileCurve, ProfileKey};
pub use region::EditRegion;
pub use storage::{
    read_grid, write_back, GridStorage, HeightBlock, MemoryGridStorage, WriteBackReport,
    WrittenArea,
};
pub use synthetic::{build_terrain, TerrainSettings};
pub use trace::{trace_descent, TraceOutcome, TraceSummary, TraceTermination};
pub use transform::{BlendFlags, BlendParams, SmoothParams};
