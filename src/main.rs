//! driftlens CLI - Column-wise Statistical Drift Detection
//!
//! Command-line interface for driftlens operations.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

fn main() -> ExitCode {
    driftlens::cli::run()
}
