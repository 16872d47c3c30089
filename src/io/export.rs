//! Export sink for classified rasters.
//!
//! Export is an asynchronous job on the storage side; this interface only
//! submits a request and surfaces the explicit success/failure status. The
//! pixel-count safety cap is enforced before any bytes are written.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ml::classify::ClassifiedRaster;
use crate::types::{BoundingBox, Crs, LcError, LcResult};

/// Parameters of one export job
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub description: String,
    pub folder: String,
    pub region: BoundingBox,
    pub scale_m: f64,
    pub crs: Crs,
    /// Safety cap: requests above this pixel count fail fast
    pub max_pixels: u64,
}

/// Outcome of a submitted export job
#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Completed { path: PathBuf, bytes: u64 },
    Failed { message: String },
}

impl ExportStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExportStatus::Completed { .. })
    }
}

/// Storage sink interface for classified rasters.
pub trait ExportSink {
    fn submit(&self, raster: &ClassifiedRaster, request: &ExportRequest) -> LcResult<ExportStatus>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportSidecar {
    description: String,
    rows: usize,
    cols: usize,
    crs: String,
    scale_m: f64,
    band: String,
    nodata_class: u16,
}

/// Sink writing the class band as little-endian u16 plus a JSON sidecar.
#[derive(Debug)]
pub struct FileExportSink {
    root: PathBuf,
}

impl FileExportSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportSink for FileExportSink {
    fn submit(&self, raster: &ClassifiedRaster, request: &ExportRequest) -> LcResult<ExportStatus> {
        let (rows, cols) = raster.classes.dim();
        let requested = rows as u64 * cols as u64;
        if requested > request.max_pixels {
            return Err(LcError::ExportLimitExceeded {
                requested,
                max: request.max_pixels,
            });
        }

        let dir = self.root.join(&request.folder);
        fs::create_dir_all(&dir)?;

        let data_path = dir.join(format!("{}.u16", request.description));
        let mut writer = BufWriter::new(fs::File::create(&data_path)?);
        for &class in raster.classes.iter() {
            writer.write_all(&class.to_le_bytes())?;
        }
        writer.flush()?;

        let sidecar = ExportSidecar {
            description: request.description.clone(),
            rows,
            cols,
            crs: request.crs.to_string(),
            scale_m: request.scale_m,
            band: "classification".to_string(),
            nodata_class: ClassifiedRaster::NODATA_CLASS,
        };
        let sidecar_path = dir.join(format!("{}.json", request.description));
        let json = serde_json::to_string_pretty(&sidecar)
            .map_err(|e| LcError::Processing(format!("sidecar serialization: {}", e)))?;
        fs::write(&sidecar_path, json)?;

        let bytes = requested * 2;
        log::info!(
            "export {} complete: {} pixels, {} bytes",
            request.description,
            requested,
            bytes
        );
        Ok(ExportStatus::Completed {
            path: data_path,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, RasterGrid};
    use ndarray::Array2;

    fn classified(rows: usize, cols: usize) -> ClassifiedRaster {
        ClassifiedRaster {
            grid: RasterGrid::new(
                rows,
                cols,
                GeoTransform::new(0.0, rows as f64, 1.0, -1.0),
                Crs::Geographic,
            ),
            classes: Array2::from_elem((rows, cols), 7),
        }
    }

    fn request(max_pixels: u64) -> ExportRequest {
        ExportRequest {
            description: "lc_map_2023_10m".to_string(),
            folder: "landcover".to_string(),
            region: BoundingBox { min_lon: 0.0, max_lon: 1.0, min_lat: 0.0, max_lat: 1.0 },
            scale_m: 10.0,
            crs: Crs::Geographic,
            max_pixels,
        }
    }

    #[test]
    fn test_export_writes_data_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileExportSink::new(dir.path());

        let status = sink.submit(&classified(4, 5), &request(1_000)).unwrap();
        match status {
            ExportStatus::Completed { path, bytes } => {
                assert!(path.exists());
                assert_eq!(bytes, 4 * 5 * 2);
                assert_eq!(fs::metadata(&path).unwrap().len(), bytes);
                let sidecar = path.with_extension("json");
                let text = fs::read_to_string(sidecar).unwrap();
                assert!(text.contains("EPSG:4326"));
            }
            ExportStatus::Failed { message } => panic!("export failed: {}", message),
        }
    }

    #[test]
    fn test_pixel_cap_enforced_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileExportSink::new(dir.path());

        let err = sink.submit(&classified(10, 10), &request(99)).unwrap_err();
        assert!(matches!(
            err,
            LcError::ExportLimitExceeded { requested: 100, max: 99 }
        ));
        // Nothing was written
        assert!(!dir.path().join("landcover").exists());
    }
}
