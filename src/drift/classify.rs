//! Column classification from the reference schema.

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    error::{Error, Result},
};

/// How a column is tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Discrete labels, tested with chi-squared
    Categorical,
    /// Native numeric values, tested with Kolmogorov-Smirnov
    Numerical,
}

impl ColumnKind {
    /// Classify an Arrow type.
    ///
    /// Native numeric and boolean types are numerical; strings,
    /// dictionaries, temporal and nested types are categorical.
    pub fn of(data_type: &DataType) -> Self {
        if data_type.is_numeric() || matches!(data_type, DataType::Boolean) {
            Self::Numerical
        } else {
            Self::Categorical
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Numerical => "numerical",
        }
    }
}

/// Reference columns split by kind, each in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnClassification {
    /// Columns tested with chi-squared
    pub categorical: Vec<String>,
    /// Columns tested with Kolmogorov-Smirnov
    pub numerical: Vec<String>,
}

impl ColumnClassification {
    /// Kind of a classified column, if present
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        if self.categorical.iter().any(|c| c == column) {
            Some(ColumnKind::Categorical)
        } else if self.numerical.iter().any(|c| c == column) {
            Some(ColumnKind::Numerical)
        } else {
            None
        }
    }

    /// All classified columns with their kind, categorical first
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.categorical
            .iter()
            .map(|c| (c.as_str(), ColumnKind::Categorical))
            .chain(
                self.numerical
                    .iter()
                    .map(|c| (c.as_str(), ColumnKind::Numerical)),
            )
    }

    /// Total number of classified columns
    pub fn len(&self) -> usize {
        self.categorical.len() + self.numerical.len()
    }

    /// True if no columns were classified
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition the reference columns into categorical and numerical sets.
///
/// # Errors
///
/// Returns [`Error::Schema`] if the reference schema has no columns.
pub fn classify<D: Dataset + ?Sized>(reference: &D) -> Result<ColumnClassification> {
    let schema = reference.schema();
    if schema.fields().is_empty() {
        return Err(Error::schema("reference dataset has no columns"));
    }

    let mut classification = ColumnClassification::default();
    for field in schema.fields() {
        match ColumnKind::of(field.data_type()) {
            ColumnKind::Categorical => classification.categorical.push(field.name().clone()),
            ColumnKind::Numerical => classification.numerical.push(field.name().clone()),
        }
    }

    tracing::trace!(
        categorical = ?classification.categorical,
        numerical = ?classification.numerical,
        "classified reference columns"
    );
    Ok(classification)
}
