//! Gray-level co-occurrence texture metrics.
//!
//! For each pixel a co-occurrence matrix is built from its square
//! neighborhood using 4 symmetric directions (0, 45, 90, 135 degrees) at the
//! configured distance, after quantizing the integer input to `levels` gray
//! levels over the global value range. Windows are clipped at raster borders.

use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::{LcError, LcResult, PixelReal, RasterData};

/// Co-occurrence texture measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlcmMetric {
    /// Angular second moment (energy)
    Asm,
    /// Local intensity variation
    Contrast,
    /// Linear dependency of gray levels
    Correlation,
    /// Gray-level variance
    Variance,
    /// Inverse difference moment (homogeneity)
    Idm,
    /// Variance of the gray-level sum distribution
    SumVariance,
    /// Entropy of the gray-level sum distribution
    SumEntropy,
    /// Randomness of the co-occurrence distribution
    Entropy,
    /// Cluster shade (skewness of the matrix)
    ClusterShade,
}

impl GlcmMetric {
    /// Suffix used when naming derived texture bands
    pub fn band_suffix(&self) -> &'static str {
        match self {
            GlcmMetric::Asm => "asm",
            GlcmMetric::Contrast => "contrast",
            GlcmMetric::Correlation => "corr",
            GlcmMetric::Variance => "var",
            GlcmMetric::Idm => "idm",
            GlcmMetric::SumVariance => "svar",
            GlcmMetric::SumEntropy => "sent",
            GlcmMetric::Entropy => "ent",
            GlcmMetric::ClusterShade => "shade",
        }
    }
}

/// Parameters for co-occurrence computation
#[derive(Debug, Clone)]
pub struct GlcmParams {
    /// Neighborhood size (must be odd)
    pub window_size: usize,
    /// Number of quantization levels
    pub levels: usize,
    /// Co-occurrence distance in pixels
    pub distance: usize,
}

impl Default for GlcmParams {
    fn default() -> Self {
        Self {
            window_size: 5,
            levels: 32,
            distance: 1,
        }
    }
}

/// Round a float raster to integers; NaN maps to 0.
pub fn to_integer(image: &RasterData) -> Array2<i32> {
    image.mapv(|v| v.round() as i32)
}

/// Scale a float raster and truncate to 16-bit integer range; NaN maps to 0.
pub fn quantize_i16(image: &RasterData, scale: PixelReal) -> Array2<i32> {
    image.mapv(|v| (v * scale) as i16 as i32)
}

/// Compute the requested texture metrics over an integer raster.
///
/// Returns one raster per metric, in input order. A raster with no gray-level
/// range (constant or empty input) yields all-NaN metrics rather than an
/// error, matching the no-data behavior of the temporal reducers.
pub fn glcm_texture(
    image: &Array2<i32>,
    params: &GlcmParams,
    metrics: &[GlcmMetric],
) -> LcResult<Vec<RasterData>> {
    if params.window_size % 2 == 0 || params.window_size < 3 {
        return Err(LcError::Processing(format!(
            "texture window size {} must be odd and >= 3",
            params.window_size
        )));
    }
    if params.levels < 2 {
        return Err(LcError::Processing(
            "texture quantization needs at least 2 levels".to_string(),
        ));
    }
    if params.distance == 0 {
        return Err(LcError::Processing(
            "co-occurrence distance must be >= 1".to_string(),
        ));
    }
    let (rows, cols) = image.dim();
    if rows < params.window_size || cols < params.window_size {
        return Err(LcError::Processing(format!(
            "image size {}x{} is too small for window size {}",
            rows, cols, params.window_size
        )));
    }

    let vmin = image.iter().copied().min().unwrap_or(0);
    let vmax = image.iter().copied().max().unwrap_or(0);
    if vmin >= vmax {
        log::warn!("texture input has no gray-level range; metrics are no-data");
        return Ok(metrics
            .iter()
            .map(|_| Array2::from_elem((rows, cols), PixelReal::NAN))
            .collect());
    }

    let n = params.levels;
    let range = (vmax - vmin) as f64;
    let half = (params.window_size / 2) as isize;
    let d = params.distance as isize;
    let directions: [(isize, isize); 4] = [(0, d), (-d, d), (-d, 0), (-d, -d)];

    let quantize = |v: i32| -> usize {
        let level = ((v - vmin) as f64 / range * (n - 1) as f64).round() as usize;
        level.min(n - 1)
    };

    let row_job = |row: usize| -> Vec<PixelReal> {
        let mut out = vec![PixelReal::NAN; metrics.len() * cols];
        let mut glcm = vec![0.0f64; n * n];
        let mut p_sum = vec![0.0f64; 2 * n - 1];

        for col in 0..cols {
            for v in glcm.iter_mut() {
                *v = 0.0;
            }
            let mut total = 0.0f64;

            for dir in &directions {
                for dr in -half..=half {
                    for dc in -half..=half {
                        let r1 = row as isize + dr;
                        let c1 = col as isize + dc;
                        let r2 = r1 + dir.0;
                        let c2 = c1 + dir.1;

                        if r1 >= 0
                            && c1 >= 0
                            && (r1 as usize) < rows
                            && (c1 as usize) < cols
                            && r2 >= 0
                            && c2 >= 0
                            && (r2 as usize) < rows
                            && (c2 as usize) < cols
                        {
                            let i = quantize(image[[r1 as usize, c1 as usize]]);
                            let j = quantize(image[[r2 as usize, c2 as usize]]);
                            glcm[i * n + j] += 1.0;
                            glcm[j * n + i] += 1.0;
                            total += 2.0;
                        }
                    }
                }
            }

            if total < 1.0 {
                continue;
            }
            for v in glcm.iter_mut() {
                *v /= total;
            }

            let stats = GlcmStats::compute(&glcm, &mut p_sum, n);
            for (m, metric) in metrics.iter().enumerate() {
                out[m * cols + col] = stats.metric(&glcm, &p_sum, n, *metric) as PixelReal;
            }
        }
        out
    };

    #[cfg(feature = "parallel")]
    let row_results: Vec<Vec<PixelReal>> = (0..rows).into_par_iter().map(row_job).collect();
    #[cfg(not(feature = "parallel"))]
    let row_results: Vec<Vec<PixelReal>> = (0..rows).map(row_job).collect();

    let mut outputs = Vec::with_capacity(metrics.len());
    for m in 0..metrics.len() {
        let mut data = Array2::from_elem((rows, cols), PixelReal::NAN);
        for (row, row_values) in row_results.iter().enumerate() {
            for col in 0..cols {
                data[[row, col]] = row_values[m * cols + col];
            }
        }
        outputs.push(data);
    }
    Ok(outputs)
}

/// Marginal statistics of one normalized co-occurrence matrix
struct GlcmStats {
    mu_i: f64,
    mu_j: f64,
    sig_i: f64,
    sig_j: f64,
}

impl GlcmStats {
    fn compute(glcm: &[f64], p_sum: &mut [f64], n: usize) -> Self {
        for v in p_sum.iter_mut() {
            *v = 0.0;
        }
        let mut mu_i = 0.0;
        let mut mu_j = 0.0;
        for i in 0..n {
            for j in 0..n {
                let p = glcm[i * n + j];
                mu_i += i as f64 * p;
                mu_j += j as f64 * p;
                p_sum[i + j] += p;
            }
        }
        let mut sig_i = 0.0;
        let mut sig_j = 0.0;
        for i in 0..n {
            for j in 0..n {
                let p = glcm[i * n + j];
                sig_i += (i as f64 - mu_i) * (i as f64 - mu_i) * p;
                sig_j += (j as f64 - mu_j) * (j as f64 - mu_j) * p;
            }
        }
        Self {
            mu_i,
            mu_j,
            sig_i: sig_i.sqrt(),
            sig_j: sig_j.sqrt(),
        }
    }

    fn metric(&self, glcm: &[f64], p_sum: &[f64], n: usize, metric: GlcmMetric) -> f64 {
        match metric {
            GlcmMetric::Asm => glcm.iter().map(|p| p * p).sum(),
            GlcmMetric::Contrast => {
                let mut val = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        let diff = i as f64 - j as f64;
                        val += glcm[i * n + j] * diff * diff;
                    }
                }
                val
            }
            GlcmMetric::Correlation => {
                if self.sig_i < 1e-12 || self.sig_j < 1e-12 {
                    return 0.0;
                }
                let mut val = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        val += glcm[i * n + j] * (i as f64 - self.mu_i) * (j as f64 - self.mu_j);
                    }
                }
                val / (self.sig_i * self.sig_j)
            }
            GlcmMetric::Variance => self.sig_i * self.sig_i,
            GlcmMetric::Idm => {
                let mut val = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        let diff = i as f64 - j as f64;
                        val += glcm[i * n + j] / (1.0 + diff * diff);
                    }
                }
                val
            }
            GlcmMetric::SumVariance => {
                let sum_avg: f64 = p_sum
                    .iter()
                    .enumerate()
                    .map(|(k, p)| k as f64 * p)
                    .sum();
                p_sum
                    .iter()
                    .enumerate()
                    .map(|(k, p)| (k as f64 - sum_avg) * (k as f64 - sum_avg) * p)
                    .sum()
            }
            GlcmMetric::SumEntropy => -p_sum
                .iter()
                .filter(|&&p| p > 0.0)
                .map(|p| p * p.ln())
                .sum::<f64>(),
            GlcmMetric::Entropy => -glcm
                .iter()
                .filter(|&&p| p > 0.0)
                .map(|p| p * p.ln())
                .sum::<f64>(),
            GlcmMetric::ClusterShade => {
                let mut val = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        let dev = i as f64 + j as f64 - self.mu_i - self.mu_j;
                        val += glcm[i * n + j] * dev * dev * dev;
                    }
                }
                val
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(size: usize) -> Array2<i32> {
        Array2::from_shape_fn((size, size), |(r, c)| (r * size + c) as i32)
    }

    #[test]
    fn test_constant_input_yields_no_data() {
        let flat = Array2::from_elem((8, 8), 42);
        let result = glcm_texture(&flat, &GlcmParams::default(), &[GlcmMetric::Contrast]).unwrap();
        assert!(result[0].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_gradient_has_contrast_and_entropy() {
        let params = GlcmParams {
            window_size: 5,
            levels: 16,
            distance: 1,
        };
        let result = glcm_texture(
            &gradient(16),
            &params,
            &[GlcmMetric::Contrast, GlcmMetric::Entropy, GlcmMetric::Asm],
        )
        .unwrap();

        let contrast = &result[0];
        let entropy = &result[1];
        let asm = &result[2];
        assert!(contrast[[8, 8]] > 0.0);
        assert!(entropy[[8, 8]] > 0.0);
        assert!(asm[[8, 8]] > 0.0 && asm[[8, 8]] <= 1.0);
    }

    #[test]
    fn test_correlation_bounded() {
        let params = GlcmParams {
            window_size: 3,
            levels: 8,
            distance: 1,
        };
        let result = glcm_texture(&gradient(12), &params, &[GlcmMetric::Correlation]).unwrap();
        for &v in result[0].iter() {
            assert!(v >= -1.0 - 1e-6 && v <= 1.0 + 1e-6, "correlation {} out of range", v);
        }
    }

    #[test]
    fn test_window_validation() {
        let img = gradient(10);
        let even = GlcmParams {
            window_size: 4,
            ..Default::default()
        };
        assert!(glcm_texture(&img, &even, &[GlcmMetric::Asm]).is_err());

        let too_small = GlcmParams {
            window_size: 11,
            ..Default::default()
        };
        assert!(glcm_texture(&img, &too_small, &[GlcmMetric::Asm]).is_err());
    }

    #[test]
    fn test_quantize_i16_truncates() {
        let band = Array2::from_elem((2, 2), 0.66667f32);
        let q = quantize_i16(&band, 10000.0);
        assert_eq!(q[[0, 0]], 6666);

        let nan = Array2::from_elem((2, 2), f32::NAN);
        assert_eq!(quantize_i16(&nan, 10000.0)[[0, 0]], 0);
    }
}
