//! Error types for driftlens.

use std::{fmt, path::PathBuf};

/// Result type alias for driftlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of an evaluation a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetRole {
    /// The baseline dataset.
    Reference,
    /// The dataset checked against the baseline.
    Comparison,
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("reference"),
            Self::Comparison => f.write_str("comparison"),
        }
    }
}

/// Errors that can occur in driftlens operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The reference dataset is malformed, or a column under test has a
    /// different kind in the comparison dataset.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of the schema problem.
        message: String,
    },

    /// A column expected in both datasets is absent from one of them.
    #[error("Column '{column}' is missing from the {dataset} dataset")]
    ColumnMissing {
        /// The missing column.
        column: String,
        /// The dataset lacking the column.
        dataset: DatasetRole,
    },

    /// A column has no usable values on one side.
    #[error("Column '{column}' has no values in the {dataset} dataset")]
    EmptySample {
        /// The empty column.
        column: String,
        /// The dataset where the sample is empty.
        dataset: DatasetRole,
    },

    /// Too few distinct categories for a chi-squared test.
    #[error(
        "Column '{column}' has {categories} distinct value(s) in the {dataset} dataset, at least 2 are required"
    )]
    DegenerateDistribution {
        /// The column under test.
        column: String,
        /// The dataset with too few categories.
        dataset: DatasetRole,
        /// Number of distinct categories observed.
        categories: usize,
    },

    /// Positional chi-squared pairing on frequency vectors of unequal length.
    #[error(
        "Column '{column}' has {comparison} categories in the comparison dataset but {reference} in the reference dataset"
    )]
    LengthMismatch {
        /// The column under test.
        column: String,
        /// Distinct categories in the comparison sample.
        comparison: usize,
        /// Distinct categories in the reference sample.
        reference: usize,
    },

    /// Batches of one dataset disagree on their schema.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// A dataset was built from zero batches.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Unsupported file format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format name or extension.
        format: String,
    },

    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error during file operations.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Serialization error (report or config).
    #[error("Format error: {0}")]
    Format(String),
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a missing column error.
    pub fn column_missing(column: impl Into<String>, dataset: DatasetRole) -> Self {
        Self::ColumnMissing {
            column: column.into(),
            dataset,
        }
    }

    /// Create an empty sample error.
    pub fn empty_sample(column: impl Into<String>, dataset: DatasetRole) -> Self {
        Self::EmptySample {
            column: column.into(),
            dataset,
        }
    }

    /// Create a degenerate distribution error.
    pub fn degenerate(column: impl Into<String>, dataset: DatasetRole, categories: usize) -> Self {
        Self::DegenerateDistribution {
            column: column.into(),
            dataset,
            categories,
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }
}
