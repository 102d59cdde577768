//! driftlens - Column-wise Statistical Drift Detection in Pure Rust
//!
//! Compares a comparison dataset against a reference dataset, column by
//! column, and reports which columns no longer match the reference
//! distribution.
//!
//! # Design Principles
//!
//! 1. **Pure function** - `evaluate(reference, comparison)` has no hidden
//!    state, no caching and no I/O
//! 2. **Schema-driven** - column kinds are looked up from the Arrow schema,
//!    never guessed from values
//! 3. **Fail whole** - a column that cannot be tested aborts the run rather
//!    than producing a partial report
//! 4. **Arrow native** - `RecordBatch` throughout, CSV/JSONL/Parquet loaders
//!
//! # Quick Start
//!
//! ```no_run
//! use driftlens::{evaluate, ArrowDataset};
//!
//! let reference = ArrowDataset::from_csv("data/reference.csv").unwrap();
//! let comparison = ArrowDataset::from_csv("data/comparison.csv").unwrap();
//!
//! let report = evaluate(&reference, &comparison).unwrap();
//! for column in &report {
//!     println!(
//!         "{:<20} {:<20} p={:.2} drift={}",
//!         column.column, column.test, column.p_value, column.drift_detected
//!     );
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::redundant_clone,
        clippy::too_many_lines,
        clippy::float_cmp,
        clippy::similar_names,
        clippy::unreadable_literal
    )
)]
// Allow some pedantic lints for cleaner code
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]

/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod dataset;
pub mod drift;
pub mod error;

// Re-export arrow types commonly needed
pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use dataset::{ArrowDataset, CsvOptions, Dataset};
pub use drift::{
    classify, evaluate, CategoricalAlignment, ColumnClassification, ColumnDrift, ColumnKind,
    DriftConfig, DriftEvaluator, DriftReport, DriftTest, KsMethod, DEFAULT_ALPHA,
};
pub use error::{DatasetRole, Error, Result};
