//! landclass: A Fast, Modular Multi-Sensor Land Cover Classification Pipeline
//!
//! This library turns multi-temporal radar and optical satellite imagery plus
//! a static elevation raster into a fixed-schema per-pixel feature stack,
//! trains a random-forest classifier on labeled ground points, and produces a
//! classified land-cover raster with accuracy diagnostics.

pub mod classes;
pub mod config;
pub mod core;
pub mod io;
pub mod ml;
pub mod pipeline;
pub mod types;

// Re-export main types and functions for easier access
pub use classes::{ClassRegistry, LandCoverClass};
pub use config::PipelineConfig;
pub use self::core::{
    random_split, FeatureImage, FeatureTable, OpticalFeatureBuilder, RadarFeatureBuilder,
    SampleExtractor, TerrainFeatureBuilder,
};
pub use io::{
    ElevationSource, ExportRequest, ExportSink, ExportStatus, GroundTruthSource, ImageryCatalog,
    PointSet, SceneFilter,
};
pub use ml::{
    ClassifiedRaster, ConfusionMatrix, Evaluator, MapClassifier, RandomForestModel,
    RandomForestParams, RandomForestTrainer,
};
pub use pipeline::{LandCoverPipeline, PipelineSources, RunSummary, SourceIds};
pub use types::{
    AcquisitionMode, BoundingBox, Crs, DateWindow, GeoTransform, ImageCollection, LcError,
    LcResult, NamedBand, OrbitDirection, PixelReal, Polarization, RasterData, RasterGrid, Scene,
    SceneMetadata,
};
