//! Accuracy assessment: confusion matrix and derived agreement metrics.
//!
//! The matrix is indexed by a fixed ordered label set; rows are reference
//! labels, columns are predictions. Ratios whose denominator class is absent
//! from the validation data are NaN, never zero.

use std::collections::HashMap;
use std::fmt;

use ndarray::{Array1, Array2};

use crate::classes::ClassRegistry;
use crate::core::sample::FeatureTable;
use crate::ml::forest::RandomForestModel;
use crate::types::{LcError, LcResult};

/// True-label x predicted-label count matrix over a fixed label set
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    counts: Array2<u64>,
}

impl ConfusionMatrix {
    /// Tally reference/predicted label pairs. Pairs with a label outside the
    /// configured set are ignored with a debug log.
    pub fn from_labels(
        truth: &Array1<usize>,
        predicted: &Array1<usize>,
        labels: &[usize],
    ) -> LcResult<Self> {
        if truth.len() != predicted.len() {
            return Err(LcError::Processing(format!(
                "{} reference labels but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }
        if labels.is_empty() {
            return Err(LcError::Processing(
                "confusion matrix needs a non-empty label set".to_string(),
            ));
        }

        let index: HashMap<usize, usize> =
            labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();
        let mut counts = Array2::zeros((labels.len(), labels.len()));
        let mut skipped = 0usize;

        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            match (index.get(&t), index.get(&p)) {
                (Some(&ti), Some(&pi)) => counts[[ti, pi]] += 1,
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::debug!("{} label pairs outside the configured class set", skipped);
        }

        Ok(Self {
            labels: labels.to_vec(),
            counts,
        })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn trace(&self) -> u64 {
        (0..self.labels.len()).map(|i| self.counts[[i, i]]).sum()
    }

    /// Overall accuracy: trace / total. NaN for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        self.trace() as f64 / self.total() as f64
    }

    /// Cohen's kappa: chance-corrected agreement in [-1, 1].
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        let po = self.trace() as f64 / total;
        let pe = (0..self.labels.len())
            .map(|i| {
                let row: u64 = self.counts.row(i).iter().sum();
                let col: u64 = self.counts.column(i).iter().sum();
                row as f64 * col as f64
            })
            .sum::<f64>()
            / (total * total);
        (po - pe) / (1.0 - pe)
    }

    /// Per-class recall (diagonal / row sum), NaN for classes absent from
    /// the reference labels.
    pub fn producers_accuracy(&self) -> Vec<f64> {
        (0..self.labels.len())
            .map(|i| {
                let row: u64 = self.counts.row(i).iter().sum();
                self.counts[[i, i]] as f64 / row as f64
            })
            .collect()
    }

    /// Per-class precision (diagonal / column sum), NaN for classes never
    /// predicted.
    pub fn consumers_accuracy(&self) -> Vec<f64> {
        (0..self.labels.len())
            .map(|i| {
                let col: u64 = self.counts.column(i).iter().sum();
                self.counts[[i, i]] as f64 / col as f64
            })
            .collect()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "confusion matrix (rows = reference, cols = predicted)")?;
        write!(f, "{:>6}", "")?;
        for label in &self.labels {
            write!(f, "{:>7}", label)?;
        }
        writeln!(f)?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{:>6}", label)?;
            for j in 0..self.labels.len() {
                write!(f, "{:>7}", self.counts[[i, j]])?;
            }
            writeln!(f)?;
        }

        writeln!(f, "overall accuracy: {:.4}", self.accuracy())?;
        writeln!(f, "kappa: {:.4}", self.kappa())?;
        writeln!(f, "{:>6} {:>9} {:>9}", "class", "producer", "consumer")?;
        let producers = self.producers_accuracy();
        let consumers = self.consumers_accuracy();
        for (i, label) in self.labels.iter().enumerate() {
            let fmt_ratio = |v: f64| {
                if v.is_nan() {
                    "n/a".to_string()
                } else {
                    format!("{:.4}", v)
                }
            };
            writeln!(
                f,
                "{:>6} {:>9} {:>9}",
                label,
                fmt_ratio(producers[i]),
                fmt_ratio(consumers[i])
            )?;
        }
        Ok(())
    }
}

/// Applies a trained model to a validation table over a fixed label set
#[derive(Debug, Clone)]
pub struct Evaluator {
    labels: Vec<usize>,
}

impl Evaluator {
    pub fn new(labels: Vec<usize>) -> Self {
        Self { labels }
    }

    /// Label set taken from a class registry, in code order.
    pub fn from_registry(registry: &ClassRegistry) -> Self {
        Self::new(registry.codes().iter().map(|&c| c as usize).collect())
    }

    pub fn evaluate(
        &self,
        model: &RandomForestModel,
        validation: &FeatureTable,
    ) -> LcResult<ConfusionMatrix> {
        let predicted = model.predict_table(validation)?;
        let matrix = ConfusionMatrix::from_labels(validation.labels(), &predicted, &self.labels)?;
        log::info!(
            "evaluated {} validation rows: accuracy {:.4}, kappa {:.4}",
            validation.n_rows(),
            matrix.accuracy(),
            matrix.kappa()
        );
        Ok(matrix)
    }
}
