//! Column-wise drift detection between a reference and a comparison dataset.
//!
//! The pipeline is a pure function of its two inputs:
//!
//! 1. [`classify`] splits the reference columns into categorical and
//!    numerical sets from their Arrow types.
//! 2. [`test_numerical`] runs a two-sample Kolmogorov-Smirnov test per
//!    numerical column.
//! 3. [`test_categorical`] runs a chi-squared goodness-of-fit test on
//!    rescaled category frequencies per categorical column.
//! 4. [`aggregate`] merges both result sets into one ordered [`DriftReport`],
//!    flagging a column when its truncated p-value is below [`DEFAULT_ALPHA`].
//!
//! [`DriftEvaluator`] wires the stages together.
//!
//! # Example
//!
//! ```no_run
//! use driftlens::{drift::evaluate, ArrowDataset};
//!
//! let reference = ArrowDataset::from_csv("data/reference.csv").unwrap();
//! let comparison = ArrowDataset::from_csv("data/comparison.csv").unwrap();
//!
//! let report = evaluate(&reference, &comparison).unwrap();
//! if report.drift_detected {
//!     println!("Drift detected in columns: {:?}", report.drifted_columns());
//! }
//! ```

// Statistical computation requires casts, similar variable names, and float literals
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::suboptimal_flops)]

use serde::{Deserialize, Serialize};

mod aggregate;
mod chi2;
mod classify;
mod evaluator;
mod ks;
mod sample;

pub use aggregate::{aggregate, aggregate_with_alpha, truncate_p_value};
pub use chi2::{
    chi_squared_statistic, test_categorical, test_categorical_with, CategoricalAlignment,
};
pub use classify::{classify, ColumnClassification, ColumnKind};
pub use evaluator::{evaluate, DriftConfig, DriftEvaluator};
pub use ks::{
    ks_statistic, ks_two_sample, test_numerical, test_numerical_with, KsMethod, KsOutcome,
    EXACT_MAX_SAMPLE,
};
pub use sample::{categorical_sample, numeric_sample};

/// Significance level below which a column is flagged as drifted.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Statistical tests used for drift detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriftTest {
    /// Kolmogorov-Smirnov test for numerical columns
    KolmogorovSmirnov,
    /// Chi-squared goodness-of-fit test for categorical columns
    ChiSquared,
}

impl DriftTest {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            Self::ChiSquared => "Chi-Squared",
        }
    }

    /// Column kind the test applies to
    pub fn column_kind(&self) -> ColumnKind {
        match self {
            Self::KolmogorovSmirnov => ColumnKind::Numerical,
            Self::ChiSquared => ColumnKind::Categorical,
        }
    }
}

impl std::fmt::Display for DriftTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one tester for one column.
///
/// `p_value` is already truncated to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScore {
    /// Column name
    pub column: String,
    /// Test statistic (KS distance or chi-squared sum)
    pub statistic: f64,
    /// Truncated p-value in [0, 1]
    pub p_value: f64,
}

impl ColumnScore {
    /// Create a score, truncating the raw p-value.
    pub fn new(column: impl Into<String>, statistic: f64, raw_p_value: f64) -> Self {
        Self {
            column: column.into(),
            statistic,
            p_value: truncate_p_value(raw_p_value),
        }
    }
}

/// Per-column drift result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    /// Column name
    pub column: String,
    /// Test used
    pub test: DriftTest,
    /// Test statistic value
    pub statistic: f64,
    /// Truncated p-value
    pub p_value: f64,
    /// Whether drift was detected for this column
    pub drift_detected: bool,
}

impl ColumnDrift {
    /// Create a column result, flagging drift when `p_value < alpha`.
    pub fn from_score(score: ColumnScore, test: DriftTest, alpha: f64) -> Self {
        Self {
            drift_detected: score.p_value < alpha,
            column: score.column,
            test,
            statistic: score.statistic,
            p_value: score.p_value,
        }
    }
}

/// Ordered drift report: categorical results first, then numerical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Per-column results in report order
    pub columns: Vec<ColumnDrift>,
    /// True if any column drifted
    pub drift_detected: bool,
    /// Significance level the columns were judged against
    pub alpha: f64,
}

impl DriftReport {
    /// Create a new drift report from ordered column results
    pub fn from_columns(columns: Vec<ColumnDrift>, alpha: f64) -> Self {
        let drift_detected = columns.iter().any(|c| c.drift_detected);
        Self {
            columns,
            drift_detected,
            alpha,
        }
    }

    /// Get columns with detected drift, in report order
    pub fn drifted_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.drift_detected)
            .map(|c| c.column.as_str())
            .collect()
    }

    /// Look up the result for a column
    pub fn get(&self, column: &str) -> Option<&ColumnDrift> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Iterate over results in report order
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDrift> {
        self.columns.iter()
    }

    /// Get number of columns analyzed
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Get number of columns with drift
    pub fn num_drifted(&self) -> usize {
        self.columns.iter().filter(|c| c.drift_detected).count()
    }

    /// Serialize the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`](crate::Error::Format) if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Format(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a DriftReport {
    type Item = &'a ColumnDrift;
    type IntoIter = std::slice::Iter<'a, ColumnDrift>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
