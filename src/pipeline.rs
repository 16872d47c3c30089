//! End-to-end orchestration: feature builders, stack assembly, sampling,
//! training, evaluation and full-map classification in dependency order.

use std::collections::BTreeMap;
use std::fmt;

use crate::classes::ClassRegistry;
use crate::config::PipelineConfig;
use crate::core::optical::OpticalFeatureBuilder;
use crate::core::radar::RadarFeatureBuilder;
use crate::core::sample::{random_split, SampleExtractor, SamplingParams};
use crate::core::stack::FeatureImage;
use crate::core::terrain::TerrainFeatureBuilder;
use crate::io::catalog::ImageryCatalog;
use crate::io::elevation::ElevationSource;
use crate::io::export::{ExportRequest, ExportSink, ExportStatus};
use crate::io::ground_truth::GroundTruthSource;
use crate::ml::classify::{ClassifiedRaster, MapClassifier};
use crate::ml::evaluate::{ConfusionMatrix, Evaluator};
use crate::ml::forest::{RandomForestParams, RandomForestTrainer};
use crate::types::{LcError, LcResult, PixelReal};

/// Identifiers of the consumed external datasets
#[derive(Debug, Clone)]
pub struct SourceIds {
    pub radar_collection: String,
    pub optical_collection: String,
    pub elevation_dataset: String,
    pub ground_truth: String,
}

/// External collaborators consumed by one run
pub struct PipelineSources<'a> {
    pub catalog: &'a dyn ImageryCatalog,
    pub ground_truth: &'a dyn GroundTruthSource,
    pub elevation: &'a dyn ElevationSource,
    pub export: &'a dyn ExportSink,
}

/// The full classification pipeline for one configuration
pub struct LandCoverPipeline {
    config: PipelineConfig,
    registry: ClassRegistry,
    radar: RadarFeatureBuilder,
    optical: OpticalFeatureBuilder,
    terrain: TerrainFeatureBuilder,
    forest: RandomForestParams,
}

impl LandCoverPipeline {
    pub fn new(config: PipelineConfig, registry: ClassRegistry) -> Self {
        Self {
            config,
            registry,
            radar: RadarFeatureBuilder::new(),
            optical: OpticalFeatureBuilder::new(),
            terrain: TerrainFeatureBuilder::new(),
            forest: RandomForestParams::default(),
        }
    }

    pub fn with_forest_params(mut self, params: RandomForestParams) -> Self {
        self.forest = params;
        self
    }

    pub fn with_builders(
        mut self,
        radar: RadarFeatureBuilder,
        optical: OpticalFeatureBuilder,
        terrain: TerrainFeatureBuilder,
    ) -> Self {
        self.radar = radar;
        self.optical = optical;
        self.terrain = terrain;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Query the sources and assemble the 41-band feature stack.
    pub fn assemble_features(
        &self,
        sources: &PipelineSources,
        ids: &SourceIds,
    ) -> LcResult<FeatureImage> {
        let radar_coll = sources
            .catalog
            .query(&ids.radar_collection, &self.radar.scene_filter(&self.config))?;
        let optical_coll = sources.catalog.query(
            &ids.optical_collection,
            &self.optical.scene_filter(&self.config),
        )?;
        let dem = sources
            .elevation
            .load(&ids.elevation_dataset, &self.config.region)?;

        if radar_coll.grid() != optical_coll.grid() || radar_coll.grid() != &dem.grid {
            return Err(LcError::Processing(
                "radar, optical and elevation inputs must share one grid".to_string(),
            ));
        }

        // The three builders are independent of one another
        let radar_bands = self.radar.build(&radar_coll)?;
        let optical_bands = self.optical.build(&optical_coll)?;
        let terrain_bands = self.terrain.build(&dem)?;

        FeatureImage::assemble(
            radar_coll.grid().clone(),
            vec![radar_bands, optical_bands, terrain_bands],
        )
    }

    /// Execute the full train/validate/classify workflow.
    pub fn run(
        &self,
        sources: &PipelineSources,
        ids: &SourceIds,
        description: &str,
    ) -> LcResult<RunSummary> {
        let image = self.assemble_features(sources, ids)?;
        log::info!(
            "feature image ready: {} bands {:?}",
            image.band_count(),
            image.band_names()
        );

        let points = sources.ground_truth.load(&ids.ground_truth)?;
        let class_histogram = points.class_histogram();
        let (train_points, val_points) = random_split(
            &points,
            self.config.split_fraction,
            self.config.split_seed,
        )?;

        let extractor = SampleExtractor::with_params(SamplingParams {
            tile_scale: self.config.tile_scale,
        });
        let training = extractor.sample_regions(&image, &train_points)?;
        let validation = extractor.sample_regions(&image, &val_points)?;

        let model = RandomForestTrainer::with_params(self.forest.clone()).fit(&training)?;
        let importance = model.named_importance(training.feature_names())?;

        let confusion = Evaluator::from_registry(&self.registry).evaluate(&model, &validation)?;

        let request = ExportRequest {
            description: description.to_string(),
            folder: self.config.export_folder.clone(),
            region: self.config.region.clone(),
            scale_m: self.config.scale_m,
            crs: self.config.crs.clone(),
            max_pixels: self.config.max_pixels,
        };
        let (classified, export) = MapClassifier::new().classify_and_export(
            &model,
            &image,
            &request,
            sources.export,
        )?;

        Ok(RunSummary {
            band_names: image.band_names().iter().map(|s| s.to_string()).collect(),
            n_points: points.len(),
            n_training: training.n_rows(),
            n_validation: validation.n_rows(),
            class_histogram,
            confusion,
            importance,
            classified,
            export,
        })
    }
}

/// Diagnostics of one completed run
pub struct RunSummary {
    pub band_names: Vec<String>,
    pub n_points: usize,
    pub n_training: usize,
    pub n_validation: usize,
    pub class_histogram: BTreeMap<u32, usize>,
    pub confusion: ConfusionMatrix,
    /// (band name, normalized importance), highest first
    pub importance: Vec<(String, PixelReal)>,
    pub classified: ClassifiedRaster,
    pub export: ExportStatus,
}

impl RunSummary {
    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    pub fn kappa(&self) -> f64 {
        self.confusion.kappa()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "land cover classification run")?;
        writeln!(f, "feature bands ({}): {}", self.band_names.len(), self.band_names.join(", "))?;
        writeln!(f, "reference points: {}", self.n_points)?;
        write!(f, "class distribution:")?;
        for (code, count) in &self.class_histogram {
            write!(f, " {}:{}", code, count)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "sampled rows: {} training, {} validation",
            self.n_training, self.n_validation
        )?;
        write!(f, "{}", self.confusion)?;
        writeln!(f, "variable importance (top 10):")?;
        for (name, value) in self.importance.iter().take(10) {
            writeln!(f, "  {:<16} {:.4}", name, value)?;
        }
        match &self.export {
            ExportStatus::Completed { path, bytes } => {
                writeln!(f, "export: completed, {} bytes at {}", bytes, path.display())
            }
            ExportStatus::Failed { message } => writeln!(f, "export: failed ({})", message),
        }
    }
}
