//! Temporal reduction of image collections.
//!
//! Each reducer collapses one band of a scene time series to a single raster,
//! pixel by pixel. Non-finite samples are ignored; a pixel with no samples
//! (including the empty-collection case) reduces to NaN rather than failing.

use ndarray::Array2;

use crate::types::{ImageCollection, LcError, LcResult, PixelReal, RasterData};

/// Collect per-scene views of one band, skipping scenes that lack it.
fn band_views<'a>(
    collection: &'a ImageCollection,
    band: &str,
) -> LcResult<Vec<&'a RasterData>> {
    let shape = collection.grid().shape();
    let mut views = Vec::new();
    for scene in collection.scenes() {
        if let Some(data) = scene.band(band) {
            if data.dim() != shape {
                return Err(LcError::Processing(format!(
                    "scene {} band {} shape {:?} does not match grid {:?}",
                    scene.metadata.scene_id,
                    band,
                    data.dim(),
                    shape
                )));
            }
            views.push(data);
        }
    }
    Ok(views)
}

fn reduce_pixels<F>(collection: &ImageCollection, band: &str, f: F) -> LcResult<RasterData>
where
    F: Fn(&mut Vec<PixelReal>) -> PixelReal,
{
    let views = band_views(collection, band)?;
    let (rows, cols) = collection.grid().shape();
    let mut output = Array2::from_elem((rows, cols), PixelReal::NAN);
    let mut samples: Vec<PixelReal> = Vec::with_capacity(views.len());

    for row in 0..rows {
        for col in 0..cols {
            samples.clear();
            for view in &views {
                let v = view[[row, col]];
                if v.is_finite() {
                    samples.push(v);
                }
            }
            if !samples.is_empty() {
                output[[row, col]] = f(&mut samples);
            }
        }
    }
    Ok(output)
}

/// Per-pixel temporal median of one band.
pub fn median(collection: &ImageCollection, band: &str) -> LcResult<RasterData> {
    reduce_pixels(collection, band, |samples| {
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = samples.len();
        if n % 2 == 1 {
            samples[n / 2]
        } else {
            0.5 * (samples[n / 2 - 1] + samples[n / 2])
        }
    })
}

/// Per-pixel temporal standard deviation of one band (sample form).
pub fn std_dev(collection: &ImageCollection, band: &str) -> LcResult<RasterData> {
    reduce_pixels(collection, band, |samples| {
        let n = samples.len();
        if n < 2 {
            return 0.0;
        }
        let mean = samples.iter().sum::<PixelReal>() / n as PixelReal;
        let var = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<PixelReal>()
            / (n - 1) as PixelReal;
        var.sqrt()
    })
}

/// Per-pixel temporal percentile of one band, with linear interpolation.
pub fn percentile(collection: &ImageCollection, band: &str, pct: f64) -> LcResult<RasterData> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(LcError::Processing(format!(
            "percentile {} outside [0, 100]",
            pct
        )));
    }
    reduce_pixels(collection, band, move |samples| {
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = samples.len();
        let rank = pct / 100.0 * (n - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            samples[lo]
        } else {
            let w = (rank - lo as f64) as PixelReal;
            samples[lo] * (1.0 - w) + samples[hi] * w
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Crs, GeoTransform, RasterGrid, Scene, SceneMetadata};
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn collection_of(values: &[PixelReal]) -> ImageCollection {
        let grid =
            RasterGrid::new(2, 2, GeoTransform::new(0.0, 2.0, 1.0, -1.0), Crs::Geographic);
        let scenes = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let mut bands = HashMap::new();
                bands.insert("VH".to_string(), Array2::from_elem((2, 2), v));
                Scene {
                    timestamp: Utc
                        .with_ymd_and_hms(2023, 1, 1 + i as u32, 0, 0, 0)
                        .unwrap(),
                    bands,
                    metadata: SceneMetadata::named(format!("s{}", i)),
                }
            })
            .collect();
        ImageCollection::new(grid, scenes)
    }

    #[test]
    fn test_median_odd_and_even() {
        let odd = median(&collection_of(&[3.0, 1.0, 2.0]), "VH").unwrap();
        assert_relative_eq!(odd[[0, 0]], 2.0);

        let even = median(&collection_of(&[4.0, 1.0, 2.0, 3.0]), "VH").unwrap();
        assert_relative_eq!(even[[1, 1]], 2.5);
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&collection_of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), "VH").unwrap();
        // Sample standard deviation of the classic 8-value set
        assert_relative_eq!(sd[[0, 1]], 2.138, epsilon = 1e-3);

        let single = std_dev(&collection_of(&[3.0]), "VH").unwrap();
        assert_relative_eq!(single[[0, 0]], 0.0);
    }

    #[test]
    fn test_percentiles_interpolate() {
        let coll = collection_of(&[10.0, 20.0, 30.0, 40.0]);
        let p25 = percentile(&coll, "VH", 25.0).unwrap();
        let p75 = percentile(&coll, "VH", 75.0).unwrap();
        assert_relative_eq!(p25[[0, 0]], 17.5);
        assert_relative_eq!(p75[[0, 0]], 32.5);
    }

    #[test]
    fn test_empty_collection_reduces_to_nan() {
        let coll = collection_of(&[]);
        let m = median(&coll, "VH").unwrap();
        assert!(m.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let coll = collection_of(&[1.0, PixelReal::NAN, 3.0]);
        let m = median(&coll, "VH").unwrap();
        assert_relative_eq!(m[[0, 0]], 2.0);
    }

    #[test]
    fn test_percentile_range_checked() {
        let coll = collection_of(&[1.0]);
        assert!(percentile(&coll, "VH", 101.0).is_err());
    }
}
