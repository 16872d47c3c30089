//! External data interfaces: imagery catalog, ground truth, elevation, export

pub mod catalog;
pub mod elevation;
pub mod export;
pub mod ground_truth;

pub use catalog::{ImageryCatalog, InMemoryCatalog, SceneFilter};
pub use elevation::{ElevationRaster, ElevationSource, InMemoryElevation};
pub use export::{ExportRequest, ExportSink, ExportStatus, FileExportSink};
pub use ground_truth::{GroundPoint, GroundTruthSource, InMemoryGroundTruth, PointSet};
