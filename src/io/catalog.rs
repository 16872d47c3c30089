//! Imagery catalog interface.
//!
//! The catalog is an external collaborator: it answers filtered queries with
//! scene collections. The pipeline only depends on the query contract here;
//! implementor failures surface unchanged as [`LcError::Upstream`] and are
//! never retried by this crate.

use std::collections::HashMap;

use crate::types::{
    AcquisitionMode, BoundingBox, DateWindow, ImageCollection, LcError, LcResult, OrbitDirection,
    Polarization, Scene,
};

/// Spatial, temporal and metadata predicates for one catalog query.
#[derive(Debug, Clone, Default)]
pub struct SceneFilter {
    pub bounds: Option<BoundingBox>,
    pub window: Option<DateWindow>,
    /// Polarization channels that must all be present on a scene
    pub polarizations: Vec<Polarization>,
    pub acquisition_mode: Option<AcquisitionMode>,
    pub orbit: Option<OrbitDirection>,
    /// Admit only scenes with cloud cover strictly below this percentage
    pub cloud_pct_max: Option<f32>,
}

impl SceneFilter {
    pub fn matches(&self, scene: &Scene) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(scene.timestamp) {
                return false;
            }
        }
        for pol in &self.polarizations {
            if !scene.metadata.polarizations.contains(pol) {
                return false;
            }
        }
        if let Some(mode) = self.acquisition_mode {
            if scene.metadata.acquisition_mode != Some(mode) {
                return false;
            }
        }
        if let Some(orbit) = self.orbit {
            if scene.metadata.orbit != Some(orbit) {
                return false;
            }
        }
        if let Some(max_pct) = self.cloud_pct_max {
            match scene.metadata.cloud_cover_pct {
                Some(pct) if pct < max_pct => {}
                _ => return false,
            }
        }
        true
    }
}

/// Query interface of the imagery hosting service.
pub trait ImageryCatalog {
    /// Scenes of a named collection matching the filter. A filter that
    /// matches nothing yields an empty collection, not an error.
    fn query(&self, collection_id: &str, filter: &SceneFilter) -> LcResult<ImageCollection>;
}

/// Catalog backed by in-memory collections, for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    collections: HashMap<String, ImageCollection>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, collection: ImageCollection) {
        self.collections.insert(id.into(), collection);
    }
}

impl ImageryCatalog for InMemoryCatalog {
    fn query(&self, collection_id: &str, filter: &SceneFilter) -> LcResult<ImageCollection> {
        let collection = self
            .collections
            .get(collection_id)
            .ok_or_else(|| LcError::Upstream {
                service: "imagery-catalog".to_string(),
                message: format!("unknown collection {}", collection_id),
            })?;

        let mut filtered = collection.retain(|s| filter.matches(s));
        if let Some(bounds) = &filter.bounds {
            filtered = filtered.filter_bounds(bounds);
        }
        log::debug!(
            "catalog query {}: {} of {} scenes match",
            collection_id,
            filtered.len(),
            collection.len()
        );
        Ok(filtered)
    }
}
