//! Immutable run configuration threaded through every pipeline stage.
//!
//! One value of [`PipelineConfig`] describes a complete run: the region and
//! seasonal window to composite over, the output resolution and CRS, the
//! train/validation split, and the resource caps on sampling and export.

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Crs, DateWindow};

/// Configuration for one classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Region of interest; spatial scope of every stage
    pub region: BoundingBox,
    /// Seasonal acquisition window for both sensors
    pub season: DateWindow,
    /// Nominal output resolution in meters
    pub scale_m: f64,
    /// Coordinate reference system of all products
    pub crs: Crs,
    /// Maximum scene cloud cover percentage admitted to the optical composite
    pub cloud_pct_max: f32,
    /// Fraction of ground points held out for validation, in [0, 1)
    pub split_fraction: f64,
    /// Seed for the split's uniform draw; None draws from entropy
    pub split_seed: Option<u64>,
    /// Tiling granularity for point sampling; higher means smaller tiles
    pub tile_scale: usize,
    /// Destination folder for exported products
    pub export_folder: String,
    /// Safety cap on exported pixel count
    pub max_pixels: u64,
}

impl PipelineConfig {
    /// Configuration with the deployment defaults: 10 m scale, EPSG:4326,
    /// <10% cloud cover, 30% validation split, tile scale 16, 1e13 pixel cap.
    pub fn new(region: BoundingBox, season: DateWindow) -> Self {
        Self {
            region,
            season,
            scale_m: 10.0,
            crs: Crs::Geographic,
            cloud_pct_max: 10.0,
            split_fraction: 0.3,
            split_seed: None,
            tile_scale: 16,
            export_folder: "landcover".to_string(),
            max_pixels: 10_u64.pow(13),
        }
    }

    pub fn with_split(mut self, fraction: f64, seed: Option<u64>) -> Self {
        self.split_fraction = fraction;
        self.split_seed = seed;
        self
    }

    pub fn with_export_folder(mut self, folder: impl Into<String>) -> Self {
        self.export_folder = folder.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_defaults() {
        let region = BoundingBox {
            min_lon: -3.3,
            max_lon: 1.2,
            min_lat: 4.7,
            max_lat: 11.2,
        };
        let season = DateWindow::new(
            Utc.with_ymd_and_hms(2022, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap(),
        );
        let cfg = PipelineConfig::new(region, season);

        assert_eq!(cfg.scale_m, 10.0);
        assert_eq!(cfg.crs, Crs::Geographic);
        assert_eq!(cfg.split_fraction, 0.3);
        assert_eq!(cfg.tile_scale, 16);
        assert_eq!(cfg.max_pixels, 10_000_000_000_000);
    }
}
