//! Full-raster classification and export trigger.
//!
//! Applies a trained model pixel-wise to the feature image, one raster row
//! per prediction batch. Pixels with any non-finite feature become the
//! nodata class.

use ndarray::Array2;

use crate::core::stack::FeatureImage;
use crate::io::export::{ExportRequest, ExportSink, ExportStatus};
use crate::ml::forest::RandomForestModel;
use crate::types::{LcError, LcResult, RasterGrid};

/// Discrete-class raster on the feature image's grid
#[derive(Debug, Clone)]
pub struct ClassifiedRaster {
    pub grid: RasterGrid,
    pub classes: Array2<u16>,
}

impl ClassifiedRaster {
    /// Class value marking pixels that could not be classified
    pub const NODATA_CLASS: u16 = 0;

    pub fn class_at(&self, row: usize, col: usize) -> u16 {
        self.classes[[row, col]]
    }
}

/// Pixel-wise model application over a feature image
#[derive(Debug, Clone, Default)]
pub struct MapClassifier;

impl MapClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify every valid pixel of the feature image.
    pub fn classify(
        &self,
        model: &RandomForestModel,
        image: &FeatureImage,
    ) -> LcResult<ClassifiedRaster> {
        if image.band_count() == 0 {
            return Err(LcError::EmptyCollection {
                stage: "map-classifier".to_string(),
            });
        }
        let (rows, cols) = image.grid().shape();
        let n_features = image.band_count();
        log::info!(
            "classifying {}x{} pixels with {} features",
            rows,
            cols,
            n_features
        );

        let mut classes = Array2::from_elem((rows, cols), ClassifiedRaster::NODATA_CLASS);
        let mut batch = Vec::with_capacity(cols * n_features);
        let mut valid_cols = Vec::with_capacity(cols);

        for row in 0..rows {
            batch.clear();
            valid_cols.clear();
            for col in 0..cols {
                let pixel = image.values_at(row, col);
                if pixel.iter().all(|v| v.is_finite()) {
                    batch.extend_from_slice(&pixel);
                    valid_cols.push(col);
                }
            }
            if valid_cols.is_empty() {
                continue;
            }

            let records = Array2::from_shape_vec((valid_cols.len(), n_features), batch.clone())
                .map_err(|e| LcError::Processing(format!("prediction batch shape: {}", e)))?;
            let predicted = model.predict(&records)?;
            for (&col, &class) in valid_cols.iter().zip(predicted.iter()) {
                classes[[row, col]] = class as u16;
            }
        }

        Ok(ClassifiedRaster {
            grid: image.grid().clone(),
            classes,
        })
    }

    /// Classify the full image and submit the result to an export sink.
    pub fn classify_and_export(
        &self,
        model: &RandomForestModel,
        image: &FeatureImage,
        request: &ExportRequest,
        sink: &dyn ExportSink,
    ) -> LcResult<(ClassifiedRaster, ExportStatus)> {
        let raster = self.classify(model, image)?;
        let status = sink.submit(&raster, request)?;
        Ok((raster, status))
    }
}
