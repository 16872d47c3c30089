//! Radar feature builder: backscatter statistics and texture from a
//! dual-polarization scene time series.
//!
//! Produces 17 bands: per-polarization temporal median, cross-polarization
//! ratio, per-polarization standard deviation and 25th/75th percentiles, and
//! 8 co-occurrence texture metrics of the integer-cast primary-channel
//! median.

use crate::config::PipelineConfig;
use crate::core::{composite, indices, texture};
use crate::core::texture::{GlcmMetric, GlcmParams};
use crate::io::catalog::SceneFilter;
use crate::types::{
    AcquisitionMode, ImageCollection, LcResult, NamedBand, OrbitDirection, Polarization,
};

/// Texture metrics kept from the primary-channel median, in band order
const TEXTURE_METRICS: [GlcmMetric; 8] = [
    GlcmMetric::Idm,
    GlcmMetric::Contrast,
    GlcmMetric::Correlation,
    GlcmMetric::Variance,
    GlcmMetric::Entropy,
    GlcmMetric::SumVariance,
    GlcmMetric::SumEntropy,
    GlcmMetric::Asm,
];

/// Radar feature parameters
#[derive(Debug, Clone)]
pub struct RadarParams {
    /// Channel used for the ratio numerator and for texture
    pub primary: Polarization,
    /// Channel used for the ratio denominator
    pub secondary: Polarization,
    pub orbit: OrbitDirection,
    pub acquisition_mode: AcquisitionMode,
    /// Temporal percentiles computed per polarization
    pub percentiles: (f64, f64),
    pub texture: GlcmParams,
}

impl Default for RadarParams {
    fn default() -> Self {
        Self {
            primary: Polarization::VH,
            secondary: Polarization::VV,
            orbit: OrbitDirection::Ascending,
            acquisition_mode: AcquisitionMode::IW,
            percentiles: (25.0, 75.0),
            texture: GlcmParams {
                window_size: 5,
                ..Default::default()
            },
        }
    }
}

/// Radar feature processor
#[derive(Debug, Clone, Default)]
pub struct RadarFeatureBuilder {
    params: RadarParams,
}

impl RadarFeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: RadarParams) -> Self {
        Self { params }
    }

    /// Catalog predicates selecting the builder's input scenes.
    pub fn scene_filter(&self, config: &PipelineConfig) -> SceneFilter {
        SceneFilter {
            bounds: Some(config.region.clone()),
            window: Some(config.season.clone()),
            polarizations: vec![self.params.primary, self.params.secondary],
            acquisition_mode: Some(self.params.acquisition_mode),
            orbit: Some(self.params.orbit),
            cloud_pct_max: None,
        }
    }

    fn band_name(&self, pol: Polarization) -> String {
        format!("{}_{}", pol, self.params.orbit.band_suffix())
    }

    /// Derive the 17 radar feature bands from a filtered collection.
    ///
    /// An empty collection yields all-NaN bands, not an error.
    pub fn build(&self, collection: &ImageCollection) -> LcResult<Vec<NamedBand>> {
        log::info!("building radar features from {} scenes", collection.len());
        if collection.is_empty() {
            log::warn!("radar collection is empty; all features will be no-data");
        }

        let pri = self.params.primary.to_string();
        let sec = self.params.secondary.to_string();
        let pri_name = self.band_name(self.params.primary);
        let sec_name = self.band_name(self.params.secondary);

        let pri_median = composite::median(collection, &pri)?;
        let sec_median = composite::median(collection, &sec)?;
        let ratio = indices::ratio(&pri_median, &sec_median)?;

        let (p_lo, p_hi) = self.params.percentiles;
        let mut bands = vec![
            NamedBand::new(pri_name.clone(), pri_median.clone()),
            NamedBand::new(sec_name.clone(), sec_median),
            NamedBand::new(
                format!(
                    "ratio_{}_{}_{}",
                    self.params.primary,
                    self.params.secondary,
                    self.params.orbit.band_suffix()
                ),
                ratio,
            ),
            NamedBand::new(
                format!("{}_sd", pri_name),
                composite::std_dev(collection, &pri)?,
            ),
            NamedBand::new(
                format!("{}_sd", sec_name),
                composite::std_dev(collection, &sec)?,
            ),
            NamedBand::new(
                format!("{}_{}", pri_name, p_lo as u32),
                composite::percentile(collection, &pri, p_lo)?,
            ),
            NamedBand::new(
                format!("{}_{}", pri_name, p_hi as u32),
                composite::percentile(collection, &pri, p_hi)?,
            ),
            NamedBand::new(
                format!("{}_{}", sec_name, p_lo as u32),
                composite::percentile(collection, &sec, p_lo)?,
            ),
            NamedBand::new(
                format!("{}_{}", sec_name, p_hi as u32),
                composite::percentile(collection, &sec, p_hi)?,
            ),
        ];

        let tex_input = texture::to_integer(&pri_median);
        let tex = texture::glcm_texture(&tex_input, &self.params.texture, &TEXTURE_METRICS)?;
        for (metric, data) in TEXTURE_METRICS.iter().zip(tex) {
            bands.push(NamedBand::new(
                format!("{}_{}", pri_name, metric.band_suffix()),
                data,
            ));
        }

        log::debug!(
            "radar features: {:?}",
            bands.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
        );
        Ok(bands)
    }
}
