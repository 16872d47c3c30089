//! Random-forest classifier: an ensemble of decision trees trained on
//! bootstrapped, feature-subsampled slices of the training table.
//!
//! The tree-building algorithm itself comes from the model runtime
//! (linfa-trees); this module owns the ensemble contract: hyperparameters,
//! the insufficient-data check, majority voting and per-feature importance.

use std::collections::BTreeMap;

use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{seq::index::sample, Rng, SeedableRng};

use crate::core::sample::FeatureTable;
use crate::types::{LcError, LcResult, PixelReal};

/// Random-forest hyperparameters
#[derive(Debug, Clone)]
pub struct RandomForestParams {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Features drawn per tree; defaults to round(sqrt(feature count))
    pub vars_per_split: Option<usize>,
    /// Fraction of rows bootstrapped per tree
    pub bag_fraction: f64,
    /// Optional depth limit per tree
    pub max_depth: Option<usize>,
    /// Seed for bootstrap and feature draws
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            vars_per_split: None,
            bag_fraction: 0.95,
            max_depth: None,
            seed: 0,
        }
    }
}

/// Trainer fitting a [`RandomForestModel`] from a feature table
#[derive(Debug, Clone, Default)]
pub struct RandomForestTrainer {
    params: RandomForestParams,
}

/// A trained ensemble with per-feature importance scores
pub struct RandomForestModel {
    trees: Vec<DecisionTree<PixelReal, usize>>,
    feature_subsets: Vec<Vec<usize>>,
    importance: Vec<PixelReal>,
    n_features: usize,
}

impl RandomForestTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: RandomForestParams) -> Self {
        Self { params }
    }

    /// Fit the ensemble on a training table.
    ///
    /// Fails with `InsufficientTrainingData` before any tree is built if the
    /// table is empty or holds fewer than 2 distinct labels.
    pub fn fit(&self, table: &FeatureTable) -> LcResult<RandomForestModel> {
        if self.params.n_trees == 0 {
            return Err(LcError::Processing("n_trees must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.params.bag_fraction) || self.params.bag_fraction == 0.0 {
            return Err(LcError::Processing(format!(
                "bag fraction {} outside (0, 1]",
                self.params.bag_fraction
            )));
        }
        if table.is_empty() {
            return Err(LcError::InsufficientTrainingData(
                "training table is empty".to_string(),
            ));
        }
        let distinct = table.distinct_labels();
        if distinct.len() < 2 {
            return Err(LcError::InsufficientTrainingData(format!(
                "{} distinct class(es) in training table, need at least 2",
                distinct.len()
            )));
        }

        let n_rows = table.n_rows();
        let n_features = table.n_features();
        let mtry = self
            .params
            .vars_per_split
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features);
        let n_bag = ((self.params.bag_fraction * n_rows as f64).ceil() as usize).max(1);

        log::info!(
            "training random forest: {} trees, {} vars per split, bag size {} of {} rows",
            self.params.n_trees,
            mtry,
            n_bag,
            n_rows
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_trees);
        let mut feature_subsets = Vec::with_capacity(self.params.n_trees);
        let mut importance = vec![0.0 as PixelReal; n_features];

        for _ in 0..self.params.n_trees {
            let rows: Vec<usize> = (0..n_bag).map(|_| rng.gen_range(0..n_rows)).collect();
            let feats: Vec<usize> = sample(&mut rng, n_features, mtry).into_iter().collect();

            let records = table
                .records()
                .select(Axis(0), &rows)
                .select(Axis(1), &feats);
            let targets: Array1<usize> = rows.iter().map(|&i| table.labels()[i]).collect();

            let dataset = Dataset::new(records, targets);
            let tree = DecisionTree::params()
                .max_depth(self.params.max_depth)
                .fit(&dataset)?;

            let decrease = tree.mean_impurity_decrease();
            for (slot, &feature) in feats.iter().enumerate() {
                importance[feature] += decrease[slot];
            }

            trees.push(tree);
            feature_subsets.push(feats);
        }

        let total: PixelReal = importance.iter().sum();
        if total > 0.0 {
            for v in importance.iter_mut() {
                *v /= total;
            }
        }

        Ok(RandomForestModel {
            trees,
            feature_subsets,
            importance,
            n_features,
        })
    }
}

impl RandomForestModel {
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Normalized per-feature importance, in feature order
    pub fn importance(&self) -> &[PixelReal] {
        &self.importance
    }

    /// Importance paired with band names, highest first
    pub fn named_importance(&self, names: &[String]) -> LcResult<Vec<(String, PixelReal)>> {
        if names.len() != self.n_features {
            return Err(LcError::Processing(format!(
                "{} names for {} features",
                names.len(),
                self.n_features
            )));
        }
        let mut pairs: Vec<(String, PixelReal)> = names
            .iter()
            .cloned()
            .zip(self.importance.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(pairs)
    }

    /// Majority-vote prediction for each row.
    pub fn predict(&self, records: &Array2<PixelReal>) -> LcResult<Array1<usize>> {
        if records.ncols() != self.n_features {
            return Err(LcError::Processing(format!(
                "prediction input has {} features, model expects {}",
                records.ncols(),
                self.n_features
            )));
        }
        let n = records.nrows();
        let mut votes: Vec<BTreeMap<usize, u32>> = vec![BTreeMap::new(); n];

        for (tree, feats) in self.trees.iter().zip(&self.feature_subsets) {
            let sub = records.select(Axis(1), feats);
            let preds: Array1<usize> = tree.predict(&sub);
            for (row, &class) in preds.iter().enumerate() {
                *votes[row].entry(class).or_insert(0) += 1;
            }
        }

        Ok(votes
            .iter()
            .map(|row_votes| {
                row_votes
                    .iter()
                    .max_by_key(|(_, &count)| count)
                    .map(|(&class, _)| class)
                    .unwrap_or(0)
            })
            .collect())
    }

    /// Predict on the rows of a sampled feature table.
    pub fn predict_table(&self, table: &FeatureTable) -> LcResult<Array1<usize>> {
        self.predict(table.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(rows: &[(f32, f32, usize)]) -> FeatureTable {
        let records = Array2::from_shape_vec(
            (rows.len(), 2),
            rows.iter().flat_map(|&(a, b, _)| [a, b]).collect(),
        )
        .unwrap();
        let labels: Array1<usize> = rows.iter().map(|&(_, _, l)| l).collect();
        FeatureTable::new(vec!["f0".to_string(), "f1".to_string()], records, labels).unwrap()
    }

    /// Both features separate the classes, so every tree splits cleanly no
    /// matter which feature subset it draws.
    fn separable_table() -> FeatureTable {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push((1.0 + 0.01 * i as f32, 4.0 + 0.01 * i as f32, 1));
            rows.push((9.0 + 0.01 * i as f32, 6.0 + 0.01 * i as f32, 2));
        }
        table_of(&rows)
    }

    /// Only the first feature carries signal; the second is constant.
    fn one_signal_table() -> FeatureTable {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push((1.0 + 0.01 * i as f32, 5.0, 1));
            rows.push((9.0 + 0.01 * i as f32, 5.0, 2));
        }
        table_of(&rows)
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let table = table_of(&[]);
        let err = RandomForestTrainer::new().fit(&table).unwrap_err();
        assert!(matches!(err, LcError::InsufficientTrainingData(_)));
    }

    #[test]
    fn test_single_class_is_insufficient() {
        let table = table_of(&[(1.0, 2.0, 3), (1.5, 2.5, 3), (0.5, 2.2, 3)]);
        let err = RandomForestTrainer::new().fit(&table).unwrap_err();
        assert!(matches!(err, LcError::InsufficientTrainingData(_)));
    }

    #[test]
    fn test_separable_classes_predicted() {
        let params = RandomForestParams {
            n_trees: 10,
            seed: 3,
            ..Default::default()
        };
        let model = RandomForestTrainer::with_params(params)
            .fit(&separable_table())
            .unwrap();

        assert_eq!(model.num_trees(), 10);
        let probe =
            Array2::from_shape_vec((2, 2), vec![1.2f32, 4.1, 9.3, 6.2]).unwrap();
        let preds = model.predict(&probe).unwrap();
        assert_eq!(preds[0], 1);
        assert_eq!(preds[1], 2);
    }

    #[test]
    fn test_importance_is_normalized_and_discriminative() {
        let params = RandomForestParams {
            n_trees: 25,
            vars_per_split: Some(2),
            seed: 9,
            ..Default::default()
        };
        let model = RandomForestTrainer::with_params(params)
            .fit(&one_signal_table())
            .unwrap();

        let importance = model.importance();
        assert_eq!(importance.len(), 2);
        assert!(importance.iter().all(|&v| v >= 0.0));
        let sum: f32 = importance.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // f0 carries all the signal, f1 is constant
        assert!(importance[0] > importance[1]);

        let named = model
            .named_importance(&["f0".to_string(), "f1".to_string()])
            .unwrap();
        assert_eq!(named[0].0, "f0");
    }

    #[test]
    fn test_predict_checks_feature_count() {
        let params = RandomForestParams {
            n_trees: 5,
            ..Default::default()
        };
        let model = RandomForestTrainer::with_params(params)
            .fit(&separable_table())
            .unwrap();
        let wrong = Array2::from_elem((1, 3), 1.0f32);
        assert!(model.predict(&wrong).is_err());
    }
}
