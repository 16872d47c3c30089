//! Labeled ground-truth point access.

use std::collections::{BTreeMap, HashMap};

use crate::types::{LcError, LcResult};

/// One labeled reference point
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPoint {
    pub lon: f64,
    pub lat: f64,
    /// Categorical land-cover class code
    pub label: u32,
}

/// A collection of labeled points sharing one label field
#[derive(Debug, Clone)]
pub struct PointSet {
    pub label_field: String,
    pub points: Vec<GroundPoint>,
}

impl PointSet {
    pub fn new(label_field: impl Into<String>, points: Vec<GroundPoint>) -> Self {
        Self {
            label_field: label_field.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point count per class code, for the training-data distribution summary
    pub fn class_histogram(&self) -> BTreeMap<u32, usize> {
        let mut histogram = BTreeMap::new();
        for point in &self.points {
            *histogram.entry(point.label).or_insert(0) += 1;
        }
        histogram
    }
}

/// Vector ground-truth store interface.
pub trait GroundTruthSource {
    fn load(&self, id: &str) -> LcResult<PointSet>;
}

/// Ground-truth store backed by in-memory point sets.
#[derive(Debug, Default)]
pub struct InMemoryGroundTruth {
    sets: HashMap<String, PointSet>,
}

impl InMemoryGroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, set: PointSet) {
        self.sets.insert(id.into(), set);
    }
}

impl GroundTruthSource for InMemoryGroundTruth {
    fn load(&self, id: &str) -> LcResult<PointSet> {
        self.sets.get(id).cloned().ok_or_else(|| LcError::Upstream {
            service: "ground-truth-store".to_string(),
            message: format!("unknown point set {}", id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_histogram() {
        let set = PointSet::new(
            "LC_code",
            vec![
                GroundPoint { lon: 0.0, lat: 0.0, label: 2 },
                GroundPoint { lon: 1.0, lat: 0.0, label: 4 },
                GroundPoint { lon: 2.0, lat: 0.0, label: 2 },
            ],
        );
        let histogram = set.class_histogram();
        assert_eq!(histogram.get(&2), Some(&2));
        assert_eq!(histogram.get(&4), Some(&1));
        assert_eq!(histogram.get(&1), None);
    }

    #[test]
    fn test_missing_point_set_is_upstream_failure() {
        let source = InMemoryGroundTruth::new();
        assert!(matches!(
            source.load("nope"),
            Err(LcError::Upstream { .. })
        ));
    }
}
