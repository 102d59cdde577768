//! Chi-squared goodness-of-fit test for categorical columns.
//!
//! Category counts from the two samples are rescaled to a common total
//! before comparison. Two alignments are supported, see
//! [`CategoricalAlignment`].

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::{sample::categorical_sample, ColumnScore};
use crate::{
    dataset::Dataset,
    error::{DatasetRole, Error, Result},
};

/// How the two frequency vectors are lined up before testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalAlignment {
    /// Align by category over the union of both samples.
    ///
    /// Observed counts come from the comparison sample; expected counts are
    /// the reference counts scaled to the comparison total.
    #[default]
    Union,
    /// Pair the two rescaled vectors index by index, each in its own
    /// first-appearance order. Unequal category counts are an error.
    Positional,
}

impl CategoricalAlignment {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Positional => "positional",
        }
    }
}

impl FromStr for CategoricalAlignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "union" => Ok(Self::Union),
            "positional" | "legacy" => Ok(Self::Positional),
            other => Err(Error::invalid_config(format!(
                "unknown categorical alignment '{}', expected union or positional",
                other
            ))),
        }
    }
}

/// Category counts in first-appearance order.
#[derive(Debug)]
struct Frequencies<'a> {
    categories: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    counts: Vec<u64>,
    total: u64,
}

impl<'a> Frequencies<'a> {
    fn count(values: &'a [String]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut categories = Vec::new();
        let mut counts: Vec<u64> = Vec::new();

        for value in values {
            let slot = *index.entry(value.as_str()).or_insert_with(|| {
                categories.push(value.as_str());
                counts.push(0);
                counts.len() - 1
            });
            counts[slot] += 1;
        }

        Self {
            categories,
            index,
            counts,
            total: values.len() as u64,
        }
    }

    fn distinct(&self) -> usize {
        self.categories.len()
    }

    fn get(&self, category: &str) -> u64 {
        self.index.get(category).map_or(0, |&i| self.counts[i])
    }

    /// Counts multiplied by `other_total / self.total`.
    fn scaled(&self, other_total: u64) -> Vec<f64> {
        let factor = other_total as f64 / self.total as f64;
        self.counts.iter().map(|&c| c as f64 * factor).collect()
    }
}

/// Pearson statistic `sum((o - e)^2 / e)`.
///
/// Cells with zero expected and zero observed count contribute nothing; zero
/// expected with a non-zero observed count makes the statistic infinite.
pub fn chi_squared_statistic(observed: &[f64], expected: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| {
            if e > 0.0 {
                (o - e) * (o - e) / e
            } else if o == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .sum()
}

/// Survival function of the chi-squared distribution with `df` degrees of
/// freedom. Non-finite statistics map to 0.
fn chi_squared_p_value(statistic: f64, df: usize) -> f64 {
    if !statistic.is_finite() {
        return 0.0;
    }
    match ChiSquared::new(df as f64) {
        Ok(dist) => dist.sf(statistic).clamp(0.0, 1.0),
        // df >= 1 is guaranteed by the two-category minimum
        Err(_) => 1.0,
    }
}

/// Observed and expected vectors for one column.
fn frequency_vectors(
    column: &str,
    x1: &Frequencies<'_>,
    x2: &Frequencies<'_>,
    alignment: CategoricalAlignment,
) -> Result<(Vec<f64>, Vec<f64>)> {
    match alignment {
        CategoricalAlignment::Positional => {
            if x1.distinct() != x2.distinct() {
                return Err(Error::LengthMismatch {
                    column: column.to_string(),
                    comparison: x1.distinct(),
                    reference: x2.distinct(),
                });
            }
            Ok((x1.scaled(x2.total), x2.scaled(x1.total)))
        }
        CategoricalAlignment::Union => {
            let seen: HashSet<&str> = x1.categories.iter().copied().collect();
            let union: Vec<&str> = x1
                .categories
                .iter()
                .copied()
                .chain(x2.categories.iter().copied().filter(|c| !seen.contains(c)))
                .collect();
            let factor = x1.total as f64 / x2.total as f64;
            let observed = union.iter().map(|c| x1.get(c) as f64).collect();
            let expected = union.iter().map(|c| x2.get(c) as f64 * factor).collect();
            Ok((observed, expected))
        }
    }
}

/// Run the chi-squared test on each categorical column, in `columns` order.
///
/// Uses [`CategoricalAlignment::Union`].
///
/// # Errors
///
/// Fails on the first column that is missing, has an empty sample, or has
/// fewer than two distinct values on either side.
pub fn test_categorical<C, R, S>(
    comparison: &C,
    reference: &R,
    columns: &[S],
) -> Result<Vec<ColumnScore>>
where
    C: Dataset + ?Sized,
    R: Dataset + ?Sized,
    S: AsRef<str>,
{
    test_categorical_with(comparison, reference, columns, CategoricalAlignment::Union)
}

/// [`test_categorical`] with an explicit alignment.
///
/// # Errors
///
/// Same as [`test_categorical`]; [`CategoricalAlignment::Positional`] also
/// fails with [`Error::LengthMismatch`] when the samples have different
/// numbers of distinct values.
pub fn test_categorical_with<C, R, S>(
    comparison: &C,
    reference: &R,
    columns: &[S],
    alignment: CategoricalAlignment,
) -> Result<Vec<ColumnScore>>
where
    C: Dataset + ?Sized,
    R: Dataset + ?Sized,
    S: AsRef<str>,
{
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            let values1 = categorical_sample(comparison, column, DatasetRole::Comparison)?;
            let values2 = categorical_sample(reference, column, DatasetRole::Reference)?;

            let x1 = Frequencies::count(&values1);
            let x2 = Frequencies::count(&values2);
            for (freq, role) in [(&x1, DatasetRole::Comparison), (&x2, DatasetRole::Reference)] {
                if freq.distinct() < 2 {
                    return Err(Error::degenerate(column, role, freq.distinct()));
                }
            }

            let (observed, expected) = frequency_vectors(column, &x1, &x2, alignment)?;
            let statistic = chi_squared_statistic(&observed, &expected);
            let p_value = chi_squared_p_value(statistic, observed.len() - 1);

            tracing::trace!(
                column,
                statistic,
                p_value,
                categories = observed.len(),
                alignment = alignment.name(),
                "chi-squared"
            );
            Ok(ColumnScore::new(column, statistic, p_value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{RecordBatch, StringArray},
        datatypes::{DataType, Field, Schema},
    };

    use super::*;
    use crate::ArrowDataset;

    fn labels(counts: &[(&str, usize)]) -> Vec<String> {
        counts.iter()
            .flat_map(|&(label, n)| std::iter::repeat(label.to_string()).take(n))
            .collect()
    }

    fn dataset(column: &str, counts: &[(&str, usize)]) -> ArrowDataset {
        let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(labels(counts)))])
            .expect("batch");
        ArrowDataset::from_batch(batch).expect("dataset")
    }

    fn score(
        comparison: &[(&str, usize)],
        reference: &[(&str, usize)],
        alignment: CategoricalAlignment,
    ) -> Result<ColumnScore> {
        let cmp = dataset("sex", comparison);
        let reference = dataset("sex", reference);
        test_categorical_with(&cmp, &reference, &["sex"], alignment)
            .map(|mut scores| scores.remove(0))
    }

    #[test]
    fn test_frequencies_first_appearance_order() {
        let values: Vec<String> = ["b", "a", "b", "c", "a", "b"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let freq = Frequencies::count(&values);

        assert_eq!(freq.categories, vec!["b", "a", "c"]);
        assert_eq!(freq.counts, vec![3, 2, 1]);
        assert_eq!(freq.total, 6);
        assert_eq!(freq.get("a"), 2);
        assert_eq!(freq.get("z"), 0);
        assert_eq!(freq.scaled(12), vec![6.0, 4.0, 2.0]);
    }

    #[test]
    fn test_statistic() {
        assert_eq!(chi_squared_statistic(&[60.0, 40.0], &[50.0, 50.0]), 4.0);
        assert_eq!(chi_squared_statistic(&[5.0, 5.0], &[5.0, 5.0]), 0.0);
        assert_eq!(chi_squared_statistic(&[0.0, 10.0], &[0.0, 10.0]), 0.0);
        assert!(chi_squared_statistic(&[1.0, 9.0], &[0.0, 10.0]).is_infinite());
    }

    #[test]
    fn test_p_value() {
        assert_eq!(chi_squared_p_value(0.0, 1), 1.0);
        assert!((chi_squared_p_value(4.0, 1) - 0.0455).abs() < 1e-4);
        assert!((chi_squared_p_value(1.6, 1) - 0.2059).abs() < 1e-4);
        assert_eq!(chi_squared_p_value(f64::INFINITY, 3), 0.0);
        assert_eq!(chi_squared_p_value(f64::NAN, 3), 0.0);
    }

    #[test]
    fn test_identical_split_no_drift() {
        let split = [("Male", 500), ("Female", 500)];
        for alignment in [CategoricalAlignment::Union, CategoricalAlignment::Positional] {
            let result = score(&split, &split, alignment).expect("chi-squared score");
            assert_eq!(result.statistic, 0.0);
            assert_eq!(result.p_value, 1.0);
        }
    }

    #[test]
    fn test_union_alignment() {
        let result = score(
            &[("A", 60), ("B", 40)],
            &[("A", 100), ("B", 100)],
            CategoricalAlignment::Union,
        )
        .expect("chi-squared score");

        assert!((result.statistic - 4.0).abs() < 1e-9);
        // raw p = 0.0455, truncated rather than rounded
        assert_eq!(result.p_value, 0.04);
    }

    #[test]
    fn test_union_aligns_by_category_not_position() {
        // same distribution, different first-appearance order
        let result = score(
            &[("Female", 30), ("Male", 70)],
            &[("Male", 70), ("Female", 30)],
            CategoricalAlignment::Union,
        )
        .expect("chi-squared score");
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_union_new_category_is_drift() {
        let result = score(
            &[("A", 10), ("B", 10), ("C", 1)],
            &[("A", 10), ("B", 10)],
            CategoricalAlignment::Union,
        )
        .expect("chi-squared score");
        assert!(result.statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn test_union_category_missing_from_comparison() {
        let result = score(
            &[("A", 50), ("B", 50)],
            &[("A", 50), ("B", 50), ("C", 50)],
            CategoricalAlignment::Union,
        )
        .expect("chi-squared score");
        assert!(result.statistic.is_finite());
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_union_high_cardinality() {
        let ids = |range: std::ops::Range<usize>| -> Vec<String> {
            range.map(|i| format!("id-{i}")).collect()
        };

        // 40 000 distinct labels per side, in opposite orders
        let forward = ids(0..40_000);
        let mut backward = forward.clone();
        backward.reverse();
        let x1 = Frequencies::count(&forward);
        let x2 = Frequencies::count(&backward);
        let (observed, expected) =
            frequency_vectors("id", &x1, &x2, CategoricalAlignment::Union).expect("vectors");
        assert_eq!(observed.len(), 40_000);
        assert_eq!(chi_squared_statistic(&observed, &expected), 0.0);

        // half overlapping: 20 000 shared, 20 000 only in each sample
        let shifted = ids(20_000..60_000);
        let x2 = Frequencies::count(&shifted);
        let (observed, expected) =
            frequency_vectors("id", &x1, &x2, CategoricalAlignment::Union).expect("vectors");
        assert_eq!(observed.len(), 60_000);
        assert_eq!(observed[..40_000].iter().sum::<f64>(), 40_000.0);
        assert!(observed[40_000..].iter().all(|&o| o == 0.0));
        assert!(expected[..20_000].iter().all(|&e| e == 0.0));
        assert!(expected[20_000..].iter().all(|&e| e == 1.0));
        assert!(chi_squared_statistic(&observed, &expected).is_infinite());
    }

    #[test]
    fn test_positional_rescaling() {
        // x1_scaled = [120, 80], x2_scaled = [50, 50]
        let result = score(
            &[("A", 60), ("B", 40)],
            &[("A", 100), ("B", 100)],
            CategoricalAlignment::Positional,
        )
        .expect("chi-squared score");
        assert!((result.statistic - 116.0).abs() < 1e-9);
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn test_positional_pairs_by_index() {
        let result = score(
            &[("Female", 30), ("Male", 70)],
            &[("Male", 70), ("Female", 30)],
            CategoricalAlignment::Positional,
        )
        .expect("chi-squared score");
        assert!(result.statistic > 0.0);
    }

    #[test]
    fn test_positional_length_mismatch() {
        let result = score(
            &[("A", 10), ("B", 10), ("C", 10)],
            &[("A", 10), ("B", 10)],
            CategoricalAlignment::Positional,
        );
        assert!(matches!(
            result,
            Err(Error::LengthMismatch {
                comparison: 3,
                reference: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_degenerate_distribution() {
        let result = score(
            &[("A", 10)],
            &[("A", 10), ("B", 10)],
            CategoricalAlignment::Union,
        );
        assert!(matches!(
            result,
            Err(Error::DegenerateDistribution {
                dataset: DatasetRole::Comparison,
                categories: 1,
                ..
            })
        ));

        let result = score(
            &[("A", 10), ("B", 10)],
            &[("B", 20)],
            CategoricalAlignment::Positional,
        );
        assert!(matches!(
            result,
            Err(Error::DegenerateDistribution {
                dataset: DatasetRole::Reference,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_column() {
        let cmp = dataset("region", &[("N", 1), ("S", 1)]);
        let reference = dataset("sex", &[("Male", 1), ("Female", 1)]);

        let result = test_categorical(&cmp, &reference, &["sex"]);
        assert!(matches!(
            result,
            Err(Error::ColumnMissing {
                dataset: DatasetRole::Comparison,
                ..
            })
        ));
    }

    #[test]
    fn test_preserves_column_order() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("sex", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Male", "Female", "Male", "Female"])),
                Arc::new(StringArray::from(vec!["N", "S", "S", "N"])),
            ],
        )
        .expect("batch");
        let ds = ArrowDataset::from_batch(batch).expect("dataset");

        let scores =
            test_categorical(&ds, &ds, &["region", "sex"]).expect("chi-squared test");
        let names: Vec<&str> = scores.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["region", "sex"]);
    }

    #[test]
    fn test_alignment_from_str() {
        assert_eq!(
            "union".parse::<CategoricalAlignment>().ok(),
            Some(CategoricalAlignment::Union)
        );
        assert_eq!(
            "Positional".parse::<CategoricalAlignment>().ok(),
            Some(CategoricalAlignment::Positional)
        );
        assert!("sorted".parse::<CategoricalAlignment>().is_err());
    }
}
