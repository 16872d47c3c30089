//! Terrain feature builder: elevation, slope and aspect.
//!
//! Slope and aspect use Horn's (1981) 3x3 weighted finite-difference
//! gradient. Border cells and cells with a NaN neighbor are NaN; flat cells
//! have slope 0 and aspect 0.

use ndarray::Array2;

use crate::io::elevation::ElevationRaster;
use crate::types::{LcResult, NamedBand, PixelReal, RasterData, RasterGrid};

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Parameters for terrain derivation
#[derive(Debug, Clone, Default)]
pub struct TerrainParams {
    /// Ground cell size in meters; derived from the grid when None
    pub cell_size_m: Option<f64>,
}

/// Terrain attribute processor
#[derive(Debug, Clone, Default)]
pub struct TerrainFeatureBuilder {
    params: TerrainParams,
}

impl TerrainFeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: TerrainParams) -> Self {
        Self { params }
    }

    /// Derive `elevation`, `slope` and `aspect` bands from an elevation raster.
    pub fn build(&self, elevation: &ElevationRaster) -> LcResult<Vec<NamedBand>> {
        let cell_size = self
            .params
            .cell_size_m
            .unwrap_or_else(|| derived_cell_size(&elevation.grid));
        log::info!(
            "building terrain features over {}x{} cells at {:.1} m",
            elevation.grid.rows,
            elevation.grid.cols,
            cell_size
        );

        let (slope, aspect) = slope_aspect(&elevation.data, cell_size);
        Ok(vec![
            NamedBand::new("elevation", elevation.data.clone()),
            NamedBand::new("slope", slope),
            NamedBand::new("aspect", aspect),
        ])
    }
}

/// Isotropic cell size in meters approximated from a geographic grid.
fn derived_cell_size(grid: &RasterGrid) -> f64 {
    let bbox = grid.bounding_box();
    let mid_lat = 0.5 * (bbox.min_lat + bbox.max_lat);
    let dy = grid.transform.pixel_height.abs() * METERS_PER_DEGREE;
    let dx = grid.transform.pixel_width.abs() * METERS_PER_DEGREE * mid_lat.to_radians().cos();
    let cell = 0.5 * (dx + dy);
    if cell > 0.0 {
        cell
    } else {
        // Degenerate transform; avoid dividing by zero downstream
        1.0
    }
}

/// Horn slope (degrees) and compass aspect (degrees, 0 = north) of a DEM.
pub fn slope_aspect(dem: &RasterData, cell_size_m: f64) -> (RasterData, RasterData) {
    let (rows, cols) = dem.dim();
    let mut slope = Array2::from_elem((rows, cols), PixelReal::NAN);
    let mut aspect = Array2::from_elem((rows, cols), PixelReal::NAN);
    let eight_cell = (8.0 * cell_size_m) as PixelReal;

    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols.saturating_sub(1) {
            let a = dem[[row - 1, col - 1]];
            let b = dem[[row - 1, col]];
            let c = dem[[row - 1, col + 1]];
            let d = dem[[row, col - 1]];
            let f = dem[[row, col + 1]];
            let g = dem[[row + 1, col - 1]];
            let h = dem[[row + 1, col]];
            let i = dem[[row + 1, col + 1]];

            if [a, b, c, d, f, g, h, i].iter().any(|v| !v.is_finite()) {
                continue;
            }

            let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / eight_cell;
            let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / eight_cell;

            let grad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
            slope[[row, col]] = grad.atan().to_degrees();

            if grad == 0.0 {
                aspect[[row, col]] = 0.0;
            } else {
                let angle = dz_dy.atan2(-dz_dx).to_degrees();
                aspect[[row, col]] = if angle > 90.0 {
                    450.0 - angle
                } else {
                    90.0 - angle
                };
            }
        }
    }
    (slope, aspect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dem_from_fn<F: Fn(usize, usize) -> f32>(size: usize, f: F) -> RasterData {
        Array2::from_shape_fn((size, size), |(r, c)| f(r, c))
    }

    #[test]
    fn test_flat_surface() {
        let dem = dem_from_fn(8, |_, _| 250.0);
        let (slope, aspect) = slope_aspect(&dem, 1.0);
        assert_relative_eq!(slope[[4, 4]], 0.0, epsilon = 1e-6);
        assert_relative_eq!(aspect[[4, 4]], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_tilted_plane_uniform_slope() {
        // z = row + col, unit cells: gradient magnitude sqrt(2)
        let dem = dem_from_fn(10, |r, c| (r + c) as f32);
        let (slope, _) = slope_aspect(&dem, 1.0);

        let expected = (2.0f32).sqrt().atan().to_degrees();
        assert_relative_eq!(slope[[4, 4]], expected, epsilon = 1e-4);
        assert_relative_eq!(slope[[7, 2]], slope[[2, 7]], epsilon = 1e-4);
    }

    #[test]
    fn test_aspect_cardinal_directions() {
        // Down toward the east: z decreases with col
        let east = dem_from_fn(8, |_, c| -(c as f32));
        let (_, aspect) = slope_aspect(&east, 1.0);
        assert_relative_eq!(aspect[[4, 4]], 90.0, epsilon = 1e-4);

        // Down toward the north: z decreases as row decreases
        let north = dem_from_fn(8, |r, _| r as f32);
        let (_, aspect) = slope_aspect(&north, 1.0);
        assert_relative_eq!(aspect[[4, 4]], 0.0, epsilon = 1e-4);

        // Down toward the south
        let south = dem_from_fn(8, |r, _| -(r as f32));
        let (_, aspect) = slope_aspect(&south, 1.0);
        assert_relative_eq!(aspect[[4, 4]], 180.0, epsilon = 1e-4);

        // Down toward the west
        let west = dem_from_fn(8, |_, c| c as f32);
        let (_, aspect) = slope_aspect(&west, 1.0);
        assert_relative_eq!(aspect[[4, 4]], 270.0, epsilon = 1e-4);
    }

    #[test]
    fn test_borders_and_nan_neighbors() {
        let mut dem = dem_from_fn(6, |r, c| (r * 6 + c) as f32);
        dem[[3, 3]] = f32::NAN;
        let (slope, _) = slope_aspect(&dem, 1.0);

        assert!(slope[[0, 2]].is_nan());
        assert!(slope[[5, 5]].is_nan());
        // All 8 neighbors of the NaN cell lose their gradient
        assert!(slope[[2, 2]].is_nan());
        assert!(slope[[4, 4]].is_nan());
        assert!(!slope[[1, 1]].is_nan());
    }
}
