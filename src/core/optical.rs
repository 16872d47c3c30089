//! Optical feature builder: cloud-filtered reflectance composite, spectral
//! indices and NDVI texture.
//!
//! Produces 21 bands: 12 reflectance bands from the per-band temporal median
//! of rescaled scenes, 4 spectral indices, and 5 co-occurrence texture
//! metrics of the integer-quantized NDVI.

use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::core::{composite, indices, texture};
use crate::core::texture::{GlcmMetric, GlcmParams};
use crate::io::catalog::SceneFilter;
use crate::types::{
    ImageCollection, LcError, LcResult, NamedBand, PixelReal, RasterData, Scene,
};

/// Texture metrics kept from the quantized NDVI, in band order
const TEXTURE_METRICS: [GlcmMetric; 5] = [
    GlcmMetric::Contrast,
    GlcmMetric::Correlation,
    GlcmMetric::Variance,
    GlcmMetric::Entropy,
    GlcmMetric::ClusterShade,
];

/// Optical feature parameters
#[derive(Debug, Clone)]
pub struct OpticalParams {
    /// Divisor mapping digital numbers to reflectance
    pub rescale_divisor: PixelReal,
    /// Bands rescaled per scene before compositing
    pub rescale_bands: Vec<String>,
    /// Quality-assurance band carried through unscaled
    pub qa_band: String,
    /// Bands kept in the median composite, in output order
    pub composite_bands: Vec<String>,
    /// Semantic band roles for the index formulas
    pub nir: String,
    pub red: String,
    pub green: String,
    pub swir: String,
    /// Soil-brightness constant for SAVI
    pub savi_l: PixelReal,
    /// Scale applied to NDVI before 16-bit truncation for texture
    pub index_scale: PixelReal,
    pub texture: GlcmParams,
}

impl Default for OpticalParams {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            rescale_divisor: 10_000.0,
            rescale_bands: names(&[
                "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B10", "B11", "B12",
            ]),
            qa_band: "QA60".to_string(),
            composite_bands: names(&[
                "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B10", "B11", "B12",
            ]),
            nir: "B8".to_string(),
            red: "B4".to_string(),
            green: "B3".to_string(),
            swir: "B11".to_string(),
            savi_l: 0.5,
            index_scale: 10_000.0,
            texture: GlcmParams {
                window_size: 3,
                ..Default::default()
            },
        }
    }
}

/// Optical feature processor
#[derive(Debug, Clone, Default)]
pub struct OpticalFeatureBuilder {
    params: OpticalParams,
}

impl OpticalFeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: OpticalParams) -> Self {
        Self { params }
    }

    /// Catalog predicates selecting the builder's input scenes.
    pub fn scene_filter(&self, config: &PipelineConfig) -> SceneFilter {
        SceneFilter {
            bounds: Some(config.region.clone()),
            window: Some(config.season.clone()),
            cloud_pct_max: Some(config.cloud_pct_max),
            ..Default::default()
        }
    }

    /// Rescale reflectance bands of one scene, keeping the QA band unscaled
    /// and preserving timestamp and metadata.
    fn rescale_scene(&self, scene: &Scene) -> Scene {
        let mut bands = HashMap::new();
        for name in &self.params.rescale_bands {
            if let Some(data) = scene.band(name) {
                bands.insert(name.clone(), data / self.params.rescale_divisor);
            }
        }
        if let Some(qa) = scene.band(&self.params.qa_band) {
            bands.insert(self.params.qa_band.clone(), qa.clone());
        }
        Scene {
            timestamp: scene.timestamp,
            bands,
            metadata: scene.metadata.clone(),
        }
    }

    /// Derive the 21 optical feature bands from a filtered collection.
    ///
    /// An empty collection yields all-NaN bands, not an error.
    pub fn build(&self, collection: &ImageCollection) -> LcResult<Vec<NamedBand>> {
        log::info!("building optical features from {} scenes", collection.len());
        if collection.is_empty() {
            log::warn!("optical collection is empty; all features will be no-data");
        }

        let prepped = collection.map(|s| self.rescale_scene(s));

        let mut bands = Vec::with_capacity(21);
        for name in &self.params.composite_bands {
            bands.push(NamedBand::new(
                name.clone(),
                composite::median(&prepped, name)?,
            ));
        }

        let nir = role_band(&bands, &self.params.nir)?;
        let red = role_band(&bands, &self.params.red)?;
        let green = role_band(&bands, &self.params.green)?;
        let swir = role_band(&bands, &self.params.swir)?;

        let ndvi = indices::ndvi(nir, red)?;
        let savi = indices::savi(nir, red, self.params.savi_l)?;
        let ndwi = indices::ndwi(green, nir)?;
        let ndbi = indices::ndbi(swir, nir)?;

        let ndvi_int = texture::quantize_i16(&ndvi, self.params.index_scale);
        let tex = texture::glcm_texture(&ndvi_int, &self.params.texture, &TEXTURE_METRICS)?;

        bands.push(NamedBand::new("NDVI", ndvi));
        bands.push(NamedBand::new("SAVI", savi));
        bands.push(NamedBand::new("NDWI", ndwi));
        bands.push(NamedBand::new("NDBI", ndbi));
        for (metric, data) in TEXTURE_METRICS.iter().zip(tex) {
            bands.push(NamedBand::new(
                format!("NDVI_{}", metric.band_suffix()),
                data,
            ));
        }

        log::debug!(
            "optical features: {:?}",
            bands.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
        );
        Ok(bands)
    }
}

fn role_band<'a>(bands: &'a [NamedBand], name: &str) -> LcResult<&'a RasterData> {
    bands
        .iter()
        .find(|b| b.name == name)
        .map(|b| &b.data)
        .ok_or_else(|| LcError::Processing(format!("index role band {} not in composite", name)))
}
