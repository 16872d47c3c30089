use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued raster pixel data
pub type PixelReal = f32;

/// 2D single-band raster data (rows x cols)
pub type RasterData = Array2<PixelReal>;

/// Polarization channels for dual-pol radar scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

/// Radar acquisition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    IW, // Interferometric Wide swath
    EW, // Extra Wide swath
    SM, // StripMap
    WV, // Wave
}

/// Orbit direction of an acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitDirection {
    Ascending,
    Descending,
}

impl OrbitDirection {
    /// Single-letter suffix used in derived band names
    pub fn band_suffix(&self) -> &'static str {
        match self {
            OrbitDirection::Ascending => "a",
            OrbitDirection::Descending => "d",
        }
    }
}

/// Coordinate reference system of a raster grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic coordinates (EPSG:4326)
    Geographic,
    /// Projected coordinates (e.g., UTM)
    Projected { epsg: u32 },
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Geographic => write!(f, "EPSG:4326"),
            Crs::Projected { epsg } => write!(f, "EPSG:{}", epsg),
        }
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }
}

/// Geospatial transformation parameters (pixel <-> geographic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub top_left_y: f64,
    pub pixel_height: f64, // negative for north-up rasters
}

impl GeoTransform {
    pub fn new(top_left_x: f64, top_left_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            top_left_x,
            pixel_width,
            top_left_y,
            pixel_height,
        }
    }

    /// Geographic coordinates of a pixel center
    pub fn pixel_to_geo(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.top_left_x + (col as f64 + 0.5) * self.pixel_width;
        let lat = self.top_left_y + (row as f64 + 0.5) * self.pixel_height;
        (lon, lat)
    }

    /// Fractional pixel coordinates of a geographic position
    pub fn geo_to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let col = (lon - self.top_left_x) / self.pixel_width;
        let row = (lat - self.top_left_y) / self.pixel_height;
        (row, col)
    }
}

/// Spatial reference of a raster product: shape, transform, CRS.
///
/// Every derived raster carries its grid; the stack assembler requires all
/// inputs to share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
    pub crs: Crs,
}

impl RasterGrid {
    pub fn new(rows: usize, cols: usize, transform: GeoTransform, crs: Crs) -> Self {
        Self {
            rows,
            cols,
            transform,
            crs,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Nearest pixel index for a geographic position, or None outside the grid
    pub fn index_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let (row, col) = self.transform.geo_to_pixel(lon, lat);
        if row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        if row < self.rows && col < self.cols {
            Some((row, col))
        } else {
            None
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let t = &self.transform;
        let x0 = t.top_left_x;
        let x1 = t.top_left_x + self.cols as f64 * t.pixel_width;
        let y0 = t.top_left_y;
        let y1 = t.top_left_y + self.rows as f64 * t.pixel_height;
        BoundingBox {
            min_lon: x0.min(x1),
            max_lon: x0.max(x1),
            min_lat: y0.min(y1),
            max_lat: y0.max(y1),
        }
    }
}

/// Half-open acquisition date interval [start, end)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Scene-level acquisition metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub scene_id: String,
    pub cloud_cover_pct: Option<f32>,
    pub polarizations: Vec<Polarization>,
    pub acquisition_mode: Option<AcquisitionMode>,
    pub orbit: Option<OrbitDirection>,
}

impl SceneMetadata {
    pub fn named(scene_id: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            cloud_cover_pct: None,
            polarizations: Vec::new(),
            acquisition_mode: None,
            orbit: None,
        }
    }
}

/// One satellite acquisition: named bands + timestamp + metadata
#[derive(Debug, Clone)]
pub struct Scene {
    pub timestamp: DateTime<Utc>,
    pub bands: HashMap<String, RasterData>,
    pub metadata: SceneMetadata,
}

impl Scene {
    pub fn band(&self, name: &str) -> Option<&RasterData> {
        self.bands.get(name)
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }
}

/// An ordered, immutable set of scenes over one grid.
///
/// Collections are never mutated; filters and maps return new collections
/// over the same grid.
#[derive(Debug, Clone)]
pub struct ImageCollection {
    grid: RasterGrid,
    scenes: Vec<Scene>,
}

impl ImageCollection {
    pub fn new(grid: RasterGrid, mut scenes: Vec<Scene>) -> Self {
        scenes.sort_by_key(|s| s.timestamp);
        Self { grid, scenes }
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Retain scenes whose grid footprint intersects the given bounds
    pub fn filter_bounds(&self, bounds: &BoundingBox) -> Self {
        if self.grid.bounding_box().intersects(bounds) {
            self.clone()
        } else {
            Self {
                grid: self.grid.clone(),
                scenes: Vec::new(),
            }
        }
    }

    /// Retain scenes acquired within [start, end)
    pub fn filter_date(&self, window: &DateWindow) -> Self {
        self.retain(|s| window.contains(s.timestamp))
    }

    /// Retain scenes satisfying an arbitrary metadata predicate
    pub fn retain<P: Fn(&Scene) -> bool>(&self, pred: P) -> Self {
        Self {
            grid: self.grid.clone(),
            scenes: self.scenes.iter().filter(|s| pred(s)).cloned().collect(),
        }
    }

    /// Apply a per-scene transformation, preserving order and grid
    pub fn map<F: Fn(&Scene) -> Scene>(&self, f: F) -> Self {
        Self {
            grid: self.grid.clone(),
            scenes: self.scenes.iter().map(|s| f(s)).collect(),
        }
    }
}

/// A single named raster layer
#[derive(Debug, Clone)]
pub struct NamedBand {
    pub name: String,
    pub data: RasterData,
}

impl NamedBand {
    pub fn new(name: impl Into<String>, data: RasterData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Error types for the classification pipeline
#[derive(Debug, thiserror::Error)]
pub enum LcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty collection at stage {stage}")]
    EmptyCollection { stage: String },

    #[error("duplicate band name in feature stack: {name}")]
    BandNameCollision { name: String },

    #[error("insufficient training data: {0}")]
    InsufficientTrainingData(String),

    #[error("export of {requested} pixels exceeds limit of {max}")]
    ExportLimitExceeded { requested: u64, max: u64 },

    #[error("upstream service {service} failed: {message}")]
    Upstream { service: String, message: String },

    #[error("model runtime error: {0}")]
    Model(#[from] linfa::error::Error),

    #[error("processing error: {0}")]
    Processing(String),
}

/// Result type for pipeline operations
pub type LcResult<T> = Result<T, LcError>;
