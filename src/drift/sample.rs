//! Extraction of one column's values from a dataset.
//!
//! Nulls are never part of a sample. Numerical samples also drop NaN and
//! infinite values.

use arrow::{
    array::{Array, Float64Array, StringArray},
    compute::cast,
    datatypes::DataType,
};

use crate::{
    dataset::Dataset,
    error::{DatasetRole, Error, Result},
};

/// Locate `column` in `dataset`, failing with the side that lacks it.
fn column_index<D: Dataset + ?Sized>(dataset: &D, column: &str, role: DatasetRole) -> Result<usize> {
    dataset
        .schema()
        .index_of(column)
        .map_err(|_| Error::column_missing(column, role))
}

/// Collect the finite values of a column as `f64`.
///
/// Any native numeric or boolean Arrow type is accepted; booleans become
/// 0.0 / 1.0.
///
/// # Errors
///
/// - [`Error::ColumnMissing`] if the column is absent
/// - [`Error::Schema`] if the column cannot be read as numbers
/// - [`Error::EmptySample`] if no finite values remain
pub fn numeric_sample<D: Dataset + ?Sized>(
    dataset: &D,
    column: &str,
    role: DatasetRole,
) -> Result<Vec<f64>> {
    let idx = column_index(dataset, column, role)?;
    let mut values = Vec::with_capacity(dataset.len());

    for batch in dataset.iter() {
        let array = cast(batch.column(idx), &DataType::Float64).map_err(|e| {
            Error::schema(format!(
                "column '{}' in the {} dataset is not numeric: {}",
                column, role, e
            ))
        })?;
        let Some(floats) = array.as_any().downcast_ref::<Float64Array>() else {
            return Err(Error::schema(format!(
                "column '{}' in the {} dataset did not cast to Float64",
                column, role
            )));
        };
        values.extend(floats.iter().flatten().filter(|v| v.is_finite()));
    }

    if values.is_empty() {
        return Err(Error::empty_sample(column, role));
    }
    Ok(values)
}

/// Collect the non-null values of a column as strings, in row order.
///
/// Non-string columns are rendered with Arrow's string cast so that, for
/// example, dates compare by their printed form.
///
/// # Errors
///
/// - [`Error::ColumnMissing`] if the column is absent
/// - [`Error::Schema`] if the column type has no string form
/// - [`Error::EmptySample`] if every value is null
pub fn categorical_sample<D: Dataset + ?Sized>(
    dataset: &D,
    column: &str,
    role: DatasetRole,
) -> Result<Vec<String>> {
    let idx = column_index(dataset, column, role)?;
    let mut values = Vec::with_capacity(dataset.len());

    for batch in dataset.iter() {
        let array = cast(batch.column(idx), &DataType::Utf8).map_err(|e| {
            Error::schema(format!(
                "column '{}' in the {} dataset has no string form: {}",
                column, role, e
            ))
        })?;
        let Some(strings) = array.as_any().downcast_ref::<StringArray>() else {
            return Err(Error::schema(format!(
                "column '{}' in the {} dataset did not cast to Utf8",
                column, role
            )));
        };
        values.extend(strings.iter().flatten().map(str::to_owned));
    }

    if values.is_empty() {
        return Err(Error::empty_sample(column, role));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{BooleanArray, Int32Array, RecordBatch},
        datatypes::{Field, Schema},
    };

    use super::*;
    use crate::ArrowDataset;

    fn dataset(fields: Vec<Field>, columns: Vec<Arc<dyn Array>>) -> ArrowDataset {
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .expect("batch");
        ArrowDataset::from_batch(batch).expect("dataset")
    }

    #[test]
    fn test_numeric_sample_skips_nulls_and_non_finite() {
        let ds = dataset(
            vec![Field::new("bp", DataType::Float64, true)],
            vec![Arc::new(Float64Array::from(vec![
                Some(120.0),
                None,
                Some(f64::NAN),
                Some(f64::INFINITY),
                Some(131.0),
            ]))],
        );

        let values = numeric_sample(&ds, "bp", DatasetRole::Reference)
            .expect("numeric sample");
        assert_eq!(values, vec![120.0, 131.0]);
    }

    #[test]
    fn test_numeric_sample_casts_integers_and_booleans() {
        let ds = dataset(
            vec![
                Field::new("age", DataType::Int32, false),
                Field::new("smoker", DataType::Boolean, false),
            ],
            vec![
                Arc::new(Int32Array::from(vec![30, 40])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        );

        let ages =
            numeric_sample(&ds, "age", DatasetRole::Comparison).expect("numeric sample");
        let smokers = numeric_sample(&ds, "smoker", DatasetRole::Comparison)
            .expect("numeric sample");
        assert_eq!(ages, vec![30.0, 40.0]);
        assert_eq!(smokers, vec![1.0, 0.0]);
    }

    #[test]
    fn test_numeric_sample_spans_batches() {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int32, false)]));
        let batches = (0..3)
            .map(|i| {
                RecordBatch::try_new(
                    Arc::clone(&schema),
                    vec![Arc::new(Int32Array::from(vec![i, i + 10]))],
                )
                .expect("batch")
            })
            .collect();
        let ds = ArrowDataset::new(batches).expect("dataset");

        let values =
            numeric_sample(&ds, "x", DatasetRole::Reference).expect("numeric sample");
        assert_eq!(values, vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0]);
    }

    #[test]
    fn test_missing_column_names_role() {
        let ds = dataset(
            vec![Field::new("sex", DataType::Utf8, false)],
            vec![Arc::new(StringArray::from(vec!["Male"]))],
        );

        let err = numeric_sample(&ds, "age", DatasetRole::Comparison);
        assert!(matches!(
            err,
            Err(Error::ColumnMissing { ref column, dataset: DatasetRole::Comparison }) if column == "age"
        ));
        let err = categorical_sample(&ds, "region", DatasetRole::Reference);
        assert!(matches!(
            err,
            Err(Error::ColumnMissing {
                dataset: DatasetRole::Reference,
                ..
            })
        ));
    }

    #[test]
    fn test_all_null_is_empty_sample() {
        let ds = dataset(
            vec![
                Field::new("bp", DataType::Float64, true),
                Field::new("sex", DataType::Utf8, true),
            ],
            vec![
                Arc::new(Float64Array::from(vec![None::<f64>, None])),
                Arc::new(StringArray::from(vec![None::<&str>, None])),
            ],
        );

        assert!(matches!(
            numeric_sample(&ds, "bp", DatasetRole::Reference),
            Err(Error::EmptySample { .. })
        ));
        assert!(matches!(
            categorical_sample(&ds, "sex", DatasetRole::Reference),
            Err(Error::EmptySample { .. })
        ));
    }

    #[test]
    fn test_categorical_sample_stringifies() {
        let ds = dataset(
            vec![
                Field::new("sex", DataType::Utf8, true),
                Field::new("ward", DataType::Int32, false),
            ],
            vec![
                Arc::new(StringArray::from(vec![Some("Male"), None, Some("Female")])),
                Arc::new(Int32Array::from(vec![3, 3, 7])),
            ],
        );

        let sexes = categorical_sample(&ds, "sex", DatasetRole::Comparison)
            .expect("categorical sample");
        let wards = categorical_sample(&ds, "ward", DatasetRole::Comparison)
            .expect("categorical sample");
        assert_eq!(sexes, vec!["Male", "Female"]);
        assert_eq!(wards, vec!["3", "3", "7"]);
    }

    #[test]
    fn test_numeric_sample_rejects_text() {
        let ds = dataset(
            vec![Field::new("sex", DataType::Utf8, false)],
            vec![Arc::new(StringArray::from(vec!["Male", "Female"]))],
        );

        // unparsable text casts to null
        assert!(matches!(
            numeric_sample(&ds, "sex", DatasetRole::Reference),
            Err(Error::EmptySample { .. })
        ));
    }
}
