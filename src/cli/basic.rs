//! Dataset loading and inspection commands.

use std::path::Path;

use crate::{drift::classify, ArrowDataset, Dataset};

/// Load a dataset from a file path based on extension.
pub(crate) fn load_dataset(path: &Path) -> crate::Result<ArrowDataset> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "parquet" => ArrowDataset::from_parquet(path),
        "csv" => ArrowDataset::from_csv(path),
        "json" | "jsonl" => ArrowDataset::from_json(path),
        ext => Err(crate::Error::unsupported_format(ext)),
    }
}

/// Render the classification of a dataset's columns.
pub(crate) fn render_classification(dataset: &ArrowDataset) -> crate::Result<String> {
    let classification = classify(dataset)?;
    let schema = dataset.schema();

    let mut lines = vec![
        format!("{:<24} {:<16} {:<12} TEST", "COLUMN", "TYPE", "KIND"),
        "-".repeat(64),
    ];
    for (column, kind) in classification.columns() {
        let data_type = schema
            .field_with_name(column)
            .map(|f| f.data_type().to_string())
            .unwrap_or_default();
        let test = match kind {
            crate::ColumnKind::Categorical => crate::DriftTest::ChiSquared,
            crate::ColumnKind::Numerical => crate::DriftTest::KolmogorovSmirnov,
        };
        lines.push(format!(
            "{:<24} {:<16} {:<12} {}",
            column,
            data_type,
            kind.name(),
            test
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "{} categorical, {} numerical",
        classification.categorical.len(),
        classification.numerical.len()
    ));
    Ok(lines.join("\n"))
}

/// Print how each column of a dataset would be tested.
pub(crate) fn cmd_classify(path: &Path) -> crate::Result<()> {
    let dataset = load_dataset(path)?;

    println!("Columns of {} ({} rows):", path.display(), dataset.len());
    println!();
    println!("{}", render_classification(&dataset)?);
    Ok(())
}
