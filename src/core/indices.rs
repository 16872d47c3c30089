//! Band algebra for spectral indices and channel ratios.
//!
//! All operations are pure per-pixel functions of their input bands. Zero
//! denominators are not guarded: 0/0 yields NaN and x/0 yields an infinity,
//! and both propagate downstream as ordinary float values.

use ndarray::Zip;

use crate::types::{LcError, LcResult, RasterData};

fn check_shape(a: &RasterData, b: &RasterData) -> LcResult<()> {
    if a.dim() != b.dim() {
        return Err(LcError::Processing(format!(
            "band shape mismatch: {:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    Ok(())
}

/// Per-pixel channel ratio a / b.
pub fn ratio(a: &RasterData, b: &RasterData) -> LcResult<RasterData> {
    check_shape(a, b)?;
    Ok(Zip::from(a).and(b).map_collect(|&a, &b| a / b))
}

/// Normalized difference (a - b) / (a + b).
pub fn normalized_difference(a: &RasterData, b: &RasterData) -> LcResult<RasterData> {
    check_shape(a, b)?;
    Ok(Zip::from(a).and(b).map_collect(|&a, &b| (a - b) / (a + b)))
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &RasterData, red: &RasterData) -> LcResult<RasterData> {
    normalized_difference(nir, red)
}

/// Soil Adjusted Vegetation Index (Huete, 1988)
///
/// `SAVI = ((NIR - Red) / (NIR + Red + L)) * (1 + L)`
pub fn savi(nir: &RasterData, red: &RasterData, l: f32) -> LcResult<RasterData> {
    check_shape(nir, red)?;
    Ok(Zip::from(nir)
        .and(red)
        .map_collect(|&n, &r| ((n - r) / (n + r + l)) * (1.0 + l)))
}

/// Normalized Difference Water Index (McFeeters, 1996)
///
/// `NDWI = (Green - NIR) / (Green + NIR)`
pub fn ndwi(green: &RasterData, nir: &RasterData) -> LcResult<RasterData> {
    normalized_difference(green, nir)
}

/// Normalized Difference Built-up Index
///
/// `NDBI = (SWIR - NIR) / (SWIR + NIR)`
pub fn ndbi(swir: &RasterData, nir: &RasterData) -> LcResult<RasterData> {
    normalized_difference(swir, nir)
}
