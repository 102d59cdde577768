//! Pipeline orchestration: classify, test, aggregate.

use std::{path::Path, thread};

use serde::{Deserialize, Serialize};

use super::{
    aggregate::aggregate_with_alpha,
    chi2::{test_categorical_with, CategoricalAlignment},
    classify::{classify, ColumnClassification, ColumnKind},
    ks::{test_numerical_with, KsMethod},
    ColumnScore, DriftReport, DEFAULT_ALPHA,
};
use crate::{
    dataset::Dataset,
    error::{DatasetRole, Error, Result},
};

/// Evaluation settings.
///
/// The defaults reproduce the fixed pipeline: alpha 0.05, automatic KS
/// method, union-aligned categories, testers run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriftConfig {
    /// Significance level, a column drifts when `p_value < alpha`
    pub alpha: f64,
    /// KS p-value method
    pub ks_method: KsMethod,
    /// Categorical frequency alignment
    pub alignment: CategoricalAlignment,
    /// Run the numerical and categorical testers on separate threads
    pub parallel: bool,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            ks_method: KsMethod::default(),
            alignment: CategoricalAlignment::default(),
            parallel: true,
        }
    }
}

impl DriftConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::InvalidConfig`] if it does not parse or fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `0 < alpha < 1`.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::invalid_config(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Runs the drift pipeline over a reference/comparison pair.
///
/// # Example
///
/// ```no_run
/// use driftlens::{drift::{DriftEvaluator, KsMethod}, ArrowDataset};
///
/// let reference = ArrowDataset::from_parquet("reference.parquet").unwrap();
/// let comparison = ArrowDataset::from_parquet("comparison.parquet").unwrap();
///
/// let report = DriftEvaluator::new()
///     .with_alpha(0.01)
///     .with_ks_method(KsMethod::Asymptotic)
///     .evaluate(&reference, &comparison)
///     .unwrap();
/// println!("{} of {} columns drifted", report.num_drifted(), report.num_columns());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DriftEvaluator {
    config: DriftConfig,
}

impl DriftEvaluator {
    /// Evaluator with the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with an explicit config
    pub fn with_config(config: DriftConfig) -> Self {
        Self { config }
    }

    /// Set the significance level
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set the KS p-value method
    #[must_use]
    pub fn with_ks_method(mut self, method: KsMethod) -> Self {
        self.config.ks_method = method;
        self
    }

    /// Set the categorical alignment
    #[must_use]
    pub fn with_alignment(mut self, alignment: CategoricalAlignment) -> Self {
        self.config.alignment = alignment;
        self
    }

    /// Enable or disable running the testers concurrently
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Current config
    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Compare `comparison` against `reference`.
    ///
    /// Any failing column aborts the whole run; no partial report is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if the config does not validate
    /// - [`Error::Schema`] if the reference has no columns, or a column has
    ///   a different kind in the comparison dataset
    /// - [`Error::ColumnMissing`], [`Error::EmptySample`],
    ///   [`Error::DegenerateDistribution`] or [`Error::LengthMismatch`] from
    ///   the testers
    pub fn evaluate<R, C>(&self, reference: &R, comparison: &C) -> Result<DriftReport>
    where
        R: Dataset + ?Sized,
        C: Dataset + ?Sized,
    {
        self.config.validate()?;

        let classification = classify(reference)?;
        tracing::debug!(
            categorical = classification.categorical.len(),
            numerical = classification.numerical.len(),
            "classified reference"
        );
        check_comparison_schema(&classification, comparison)?;

        let (numerical, categorical) = if self.config.parallel {
            thread::scope(|scope| {
                let numerical =
                    scope.spawn(|| self.run_numerical(&classification, reference, comparison));
                let categorical = self.run_categorical(&classification, reference, comparison);
                let numerical = numerical
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                (numerical, categorical)
            })
        } else {
            let numerical = self.run_numerical(&classification, reference, comparison);
            let categorical = self.run_categorical(&classification, reference, comparison);
            (numerical, categorical)
        };
        // numerical stage errors take precedence
        let numerical = numerical?;
        let categorical = categorical?;

        let report = aggregate_with_alpha(numerical, categorical, self.config.alpha);
        tracing::debug!(
            columns = report.num_columns(),
            drifted = report.num_drifted(),
            drift_detected = report.drift_detected,
            "drift evaluation complete"
        );
        Ok(report)
    }

    fn run_numerical<R, C>(
        &self,
        classification: &ColumnClassification,
        reference: &R,
        comparison: &C,
    ) -> Result<Vec<ColumnScore>>
    where
        R: Dataset + ?Sized,
        C: Dataset + ?Sized,
    {
        let scores = test_numerical_with(
            comparison,
            reference,
            &classification.numerical,
            self.config.ks_method,
        )?;
        tracing::debug!(columns = scores.len(), "numerical columns tested");
        Ok(scores)
    }

    fn run_categorical<R, C>(
        &self,
        classification: &ColumnClassification,
        reference: &R,
        comparison: &C,
    ) -> Result<Vec<ColumnScore>>
    where
        R: Dataset + ?Sized,
        C: Dataset + ?Sized,
    {
        let scores = test_categorical_with(
            comparison,
            reference,
            &classification.categorical,
            self.config.alignment,
        )?;
        tracing::debug!(columns = scores.len(), "categorical columns tested");
        Ok(scores)
    }
}

/// Evaluate with the default config.
///
/// # Errors
///
/// See [`DriftEvaluator::evaluate`].
pub fn evaluate<R, C>(reference: &R, comparison: &C) -> Result<DriftReport>
where
    R: Dataset + ?Sized,
    C: Dataset + ?Sized,
{
    DriftEvaluator::new().evaluate(reference, comparison)
}

/// Every classified column must exist in the comparison dataset with the
/// same kind.
fn check_comparison_schema<C: Dataset + ?Sized>(
    classification: &ColumnClassification,
    comparison: &C,
) -> Result<()> {
    let schema = comparison.schema();
    for (column, kind) in classification.columns() {
        let field = schema
            .field_with_name(column)
            .map_err(|_| Error::column_missing(column, DatasetRole::Comparison))?;
        let found = ColumnKind::of(field.data_type());
        if found != kind {
            return Err(Error::schema(format!(
                "column '{}' is {} in the reference dataset but {} ({}) in the comparison dataset",
                column,
                kind.name(),
                found.name(),
                field.data_type()
            )));
        }
    }
    Ok(())
}
