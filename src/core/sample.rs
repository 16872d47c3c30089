//! Ground-point sampling and train/validation splitting.
//!
//! Sampling intersects labeled points with the feature image: one table row
//! per point falling on a pixel where every band is finite. Points outside
//! the raster's valid-data extent are dropped silently. Splitting assigns
//! each point one uniform key in [0, 1) and partitions at a single
//! threshold: validation below, training at or above.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::stack::FeatureImage;
use crate::io::ground_truth::PointSet;
use crate::types::{LcError, LcResult, PixelReal};

/// Tabular feature/label rows sampled at ground points
#[derive(Debug, Clone)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    records: Array2<PixelReal>,
    labels: Array1<usize>,
}

impl FeatureTable {
    pub fn new(
        feature_names: Vec<String>,
        records: Array2<PixelReal>,
        labels: Array1<usize>,
    ) -> LcResult<Self> {
        if records.nrows() != labels.len() {
            return Err(LcError::Processing(format!(
                "{} feature rows but {} labels",
                records.nrows(),
                labels.len()
            )));
        }
        if records.ncols() != feature_names.len() {
            return Err(LcError::Processing(format!(
                "{} feature columns but {} names",
                records.ncols(),
                feature_names.len()
            )));
        }
        Ok(Self {
            feature_names,
            records,
            labels,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.records.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.records.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn records(&self) -> &Array2<PixelReal> {
        &self.records
    }

    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    pub fn distinct_labels(&self) -> BTreeSet<usize> {
        self.labels.iter().copied().collect()
    }
}

/// Sampling parameters
#[derive(Debug, Clone)]
pub struct SamplingParams {
    /// Tiling granularity; points are processed in roughly this many chunks
    /// to bound per-chunk memory
    pub tile_scale: usize,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self { tile_scale: 16 }
    }
}

/// Point-sampling processor
#[derive(Debug, Clone, Default)]
pub struct SampleExtractor {
    params: SamplingParams,
}

impl SampleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Read every feature band at each point's pixel, one row per point
    /// inside the valid-data extent.
    pub fn sample_regions(
        &self,
        image: &FeatureImage,
        points: &PointSet,
    ) -> LcResult<FeatureTable> {
        let n_features = image.band_count();
        let tile = (points.len() / self.params.tile_scale.max(1)).max(1);

        let mut values = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0usize;

        for chunk in points.points.chunks(tile) {
            for point in chunk {
                let Some((row, col)) = image.grid().index_of(point.lon, point.lat) else {
                    dropped += 1;
                    continue;
                };
                let pixel = image.values_at(row, col);
                if pixel.iter().any(|v| !v.is_finite()) {
                    dropped += 1;
                    continue;
                }
                values.extend_from_slice(&pixel);
                labels.push(point.label as usize);
            }
        }

        if dropped > 0 {
            log::debug!(
                "dropped {} of {} points outside the valid-data extent",
                dropped,
                points.len()
            );
        }
        log::info!("sampled {} rows x {} features", labels.len(), n_features);

        let records = Array2::from_shape_vec((labels.len(), n_features), values)
            .map_err(|e| LcError::Processing(format!("sample table shape: {}", e)))?;
        FeatureTable::new(
            image.band_names().iter().map(|s| s.to_string()).collect(),
            records,
            Array1::from(labels),
        )
    }
}

/// Partition points into (training, validation) at a single random-key
/// threshold: keys in [0, fraction) validate, the rest train.
///
/// A seed makes the draw reproducible; None draws from entropy.
pub fn random_split(
    points: &PointSet,
    fraction: f64,
    seed: Option<u64>,
) -> LcResult<(PointSet, PointSet)> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(LcError::Processing(format!(
            "split fraction {} outside [0, 1)",
            fraction
        )));
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut training = Vec::new();
    let mut validation = Vec::new();
    for point in &points.points {
        let key: f64 = rng.gen();
        if key < fraction {
            validation.push(point.clone());
        } else {
            training.push(point.clone());
        }
    }
    log::info!(
        "split {} points: {} training, {} validation (fraction {})",
        points.len(),
        training.len(),
        validation.len(),
        fraction
    );
    Ok((
        PointSet::new(points.label_field.clone(), training),
        PointSet::new(points.label_field.clone(), validation),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ground_truth::GroundPoint;
    use crate::types::{Crs, GeoTransform, NamedBand, RasterGrid};
    use ndarray::Array2;

    fn image() -> FeatureImage {
        let grid =
            RasterGrid::new(6, 6, GeoTransform::new(0.0, 6.0, 1.0, -1.0), Crs::Geographic);
        let mut slope = Array2::from_elem((6, 6), 4.0f32);
        slope[[2, 2]] = f32::NAN;
        FeatureImage::assemble(
            grid,
            vec![vec![
                NamedBand::new("NDVI", Array2::from_elem((6, 6), 0.5f32)),
                NamedBand::new("slope", slope),
            ]],
        )
        .unwrap()
    }

    fn points_at(coords: &[(f64, f64)]) -> PointSet {
        PointSet::new(
            "LC_code",
            coords
                .iter()
                .enumerate()
                .map(|(i, &(lon, lat))| GroundPoint {
                    lon,
                    lat,
                    label: (i % 3 + 1) as u32,
                })
                .collect(),
        )
    }

    #[test]
    fn test_sample_regions_reads_all_bands() {
        let set = points_at(&[(0.5, 5.5), (3.5, 3.5)]);
        let table = SampleExtractor::new().sample_regions(&image(), &set).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_features(), 2);
        assert_eq!(table.feature_names(), &["NDVI".to_string(), "slope".to_string()]);
        assert_eq!(table.records()[[0, 0]], 0.5);
        assert_eq!(table.records()[[0, 1]], 4.0);
        assert_eq!(table.labels()[0], 1);
    }

    #[test]
    fn test_outside_and_nan_points_dropped_silently() {
        // Second point is outside the grid; third lands on the NaN slope pixel
        let set = points_at(&[(0.5, 5.5), (9.0, 9.0), (2.5, 3.5)]);
        let table = SampleExtractor::new().sample_regions(&image(), &set).unwrap();
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn test_split_is_exhaustive_and_disjoint() {
        let coords: Vec<(f64, f64)> = (0..200).map(|i| (i as f64 * 0.01, 3.0)).collect();
        let set = points_at(&coords);

        for fraction in [0.0, 0.3, 0.5, 0.9] {
            let (train, val) = random_split(&set, fraction, Some(7)).unwrap();
            assert_eq!(train.len() + val.len(), set.len());
            for p in &val.points {
                assert!(!train.points.contains(p));
            }
        }
    }

    #[test]
    fn test_split_zero_fraction_keeps_all_training() {
        let set = points_at(&[(0.5, 5.5), (1.5, 4.5), (2.5, 3.5)]);
        let (train, val) = random_split(&set, 0.0, Some(1)).unwrap();
        assert_eq!(train.len(), 3);
        assert_eq!(val.len(), 0);
    }

    #[test]
    fn test_split_reproducible_with_seed() {
        let coords: Vec<(f64, f64)> = (0..50).map(|i| (i as f64 * 0.1, 2.0)).collect();
        let set = points_at(&coords);

        let (t1, v1) = random_split(&set, 0.3, Some(42)).unwrap();
        let (t2, v2) = random_split(&set, 0.3, Some(42)).unwrap();
        assert_eq!(t1.points, t2.points);
        assert_eq!(v1.points, v2.points);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let set = points_at(&[(0.5, 5.5)]);
        assert!(random_split(&set, 1.0, None).is_err());
        assert!(random_split(&set, -0.1, None).is_err());
    }
}
