//! Feature stack assembly.
//!
//! Concatenates the feature builders' outputs band-wise into one raster with
//! globally unique band names over a single grid. Name collisions and shape
//! mismatches fail fast; nothing is renamed silently.

use std::collections::HashSet;

use crate::types::{LcError, LcResult, NamedBand, PixelReal, RasterData, RasterGrid};

/// A fixed, ordered, uniquely-named multi-band raster
#[derive(Debug, Clone)]
pub struct FeatureImage {
    grid: RasterGrid,
    bands: Vec<NamedBand>,
}

impl FeatureImage {
    /// Assemble band groups into one stack, validating names and shapes.
    pub fn assemble(grid: RasterGrid, groups: Vec<Vec<NamedBand>>) -> LcResult<Self> {
        let mut seen = HashSet::new();
        let mut bands = Vec::new();
        for group in groups {
            for band in group {
                if band.data.dim() != grid.shape() {
                    return Err(LcError::Processing(format!(
                        "band {} shape {:?} does not match grid {:?}",
                        band.name,
                        band.data.dim(),
                        grid.shape()
                    )));
                }
                if !seen.insert(band.name.clone()) {
                    return Err(LcError::BandNameCollision { name: band.name });
                }
                bands.push(band);
            }
        }
        log::info!("assembled feature stack with {} bands", bands.len());
        Ok(Self { grid, bands })
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Option<&RasterData> {
        self.bands.iter().find(|b| b.name == name).map(|b| &b.data)
    }

    pub fn bands(&self) -> &[NamedBand] {
        &self.bands
    }

    /// All band values at one pixel, in band order.
    pub fn values_at(&self, row: usize, col: usize) -> Vec<PixelReal> {
        self.bands.iter().map(|b| b.data[[row, col]]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Crs, GeoTransform};
    use ndarray::Array2;

    fn grid() -> RasterGrid {
        RasterGrid::new(4, 4, GeoTransform::new(0.0, 4.0, 1.0, -1.0), Crs::Geographic)
    }

    fn band(name: &str, value: f32) -> NamedBand {
        NamedBand::new(name, Array2::from_elem((4, 4), value))
    }

    #[test]
    fn test_assemble_concatenates_in_order() {
        let stack = FeatureImage::assemble(
            grid(),
            vec![
                vec![band("VH_a", 1.0), band("VV_a", 2.0)],
                vec![band("NDVI", 3.0)],
                vec![band("elevation", 4.0)],
            ],
        )
        .unwrap();

        assert_eq!(stack.band_count(), 4);
        assert_eq!(stack.band_names(), vec!["VH_a", "VV_a", "NDVI", "elevation"]);
        assert_eq!(stack.values_at(2, 2), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_duplicate_name_fails_fast() {
        let err = FeatureImage::assemble(
            grid(),
            vec![vec![band("NDVI", 1.0)], vec![band("NDVI", 2.0)]],
        )
        .unwrap_err();
        match err {
            LcError::BandNameCollision { name } => assert_eq!(name, "NDVI"),
            other => panic!("expected BandNameCollision, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let wrong = NamedBand::new("slope", Array2::from_elem((3, 4), 0.0));
        assert!(FeatureImage::assemble(grid(), vec![vec![wrong]]).is_err());
    }
}
