//! Static elevation data access.

use std::collections::HashMap;

use crate::types::{BoundingBox, LcError, LcResult, RasterData, RasterGrid};

/// A single elevation raster clipped to a region of interest
#[derive(Debug, Clone)]
pub struct ElevationRaster {
    pub grid: RasterGrid,
    pub data: RasterData,
}

impl ElevationRaster {
    pub fn new(grid: RasterGrid, data: RasterData) -> LcResult<Self> {
        if data.dim() != grid.shape() {
            return Err(LcError::Processing(format!(
                "elevation data shape {:?} does not match grid {:?}",
                data.dim(),
                grid.shape()
            )));
        }
        Ok(Self { grid, data })
    }
}

/// Elevation data service interface.
pub trait ElevationSource {
    /// Elevation raster for a static dataset id, clipped to the given bounds.
    fn load(&self, dataset_id: &str, bounds: &BoundingBox) -> LcResult<ElevationRaster>;
}

/// Elevation source backed by in-memory rasters.
#[derive(Debug, Default)]
pub struct InMemoryElevation {
    rasters: HashMap<String, ElevationRaster>,
}

impl InMemoryElevation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, raster: ElevationRaster) {
        self.rasters.insert(id.into(), raster);
    }
}

impl ElevationSource for InMemoryElevation {
    fn load(&self, dataset_id: &str, bounds: &BoundingBox) -> LcResult<ElevationRaster> {
        let raster = self
            .rasters
            .get(dataset_id)
            .ok_or_else(|| LcError::Upstream {
                service: "elevation-service".to_string(),
                message: format!("unknown dataset {}", dataset_id),
            })?;
        if !raster.grid.bounding_box().intersects(bounds) {
            return Err(LcError::Upstream {
                service: "elevation-service".to_string(),
                message: format!("dataset {} does not cover requested bounds", dataset_id),
            });
        }
        Ok(raster.clone())
    }
}
