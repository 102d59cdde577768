//! Drift detection CLI command.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use super::basic::load_dataset;
use crate::drift::{CategoricalAlignment, DriftConfig, DriftEvaluator, DriftReport, KsMethod};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Arguments of `driftlens detect`.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Reference (baseline) dataset
    #[arg(short, long)]
    pub reference: PathBuf,
    /// Comparison dataset to test against the reference
    #[arg(short, long)]
    pub comparison: PathBuf,
    /// Significance threshold (alpha), overrides the config file
    #[arg(short, long)]
    pub alpha: Option<f64>,
    /// KS p-value method (auto, exact, asymptotic)
    #[arg(long)]
    pub ks_method: Option<KsMethod>,
    /// Categorical alignment (union, positional)
    #[arg(long)]
    pub alignment: Option<CategoricalAlignment>,
    /// Run the numerical and categorical testers one after the other
    #[arg(long)]
    pub sequential: bool,
    /// JSON config file with alpha, ks_method, alignment and parallel
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DetectArgs {
    /// Config file (or defaults) with command-line overrides applied.
    pub(crate) fn drift_config(&self) -> crate::Result<DriftConfig> {
        let mut config = match &self.config {
            Some(path) => DriftConfig::from_json_file(path)?,
            None => DriftConfig::default(),
        };
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(method) = self.ks_method {
            config.ks_method = method;
        }
        if let Some(alignment) = self.alignment {
            config.alignment = alignment;
        }
        if self.sequential {
            config.parallel = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Render a report as a text table.
pub(crate) fn render_text(report: &DriftReport, reference: &Path, comparison: &Path) -> String {
    let mut lines = vec![
        "Drift Detection Report".to_string(),
        "======================".to_string(),
        format!("Reference:  {}", reference.display()),
        format!("Comparison: {}", comparison.display()),
        format!("Alpha:      {}", report.alpha),
        String::new(),
    ];

    if report.drift_detected {
        lines.push(format!(
            "DRIFT DETECTED in {} of {} columns",
            report.num_drifted(),
            report.num_columns()
        ));
    } else {
        lines.push("No significant drift detected".to_string());
    }
    lines.push(String::new());

    lines.push(format!(
        "{:<24} {:<20} {:<12} {:<10} DRIFT",
        "COLUMN", "TEST", "STATISTIC", "P-VALUE"
    ));
    lines.push("-".repeat(76));
    for column in report {
        lines.push(format!(
            "{:<24} {:<20} {:<12.4} {:<10.2} {}",
            column.column,
            column.test.name(),
            column.statistic,
            column.p_value,
            if column.drift_detected { "YES" } else { "no" }
        ));
    }

    lines.join("\n")
}

/// Detect drift between the reference and comparison datasets.
pub(crate) fn cmd_detect(args: &DetectArgs) -> crate::Result<()> {
    let config = args.drift_config()?;
    let reference = load_dataset(&args.reference)?;
    let comparison = load_dataset(&args.comparison)?;

    let report = DriftEvaluator::with_config(config).evaluate(&reference, &comparison)?;

    let rendered = match args.format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Text => render_text(&report, &args.reference, &args.comparison),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .map_err(|e| crate::Error::io(e, path))?;
            println!("Drift report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
