//! Two-sample Kolmogorov-Smirnov test for numerical columns.

use std::{f64::consts::PI, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{sample::numeric_sample, ColumnScore};
use crate::{
    dataset::Dataset,
    error::{DatasetRole, Error, Result},
};

/// Largest sample for which [`KsMethod::Auto`] picks the exact distribution.
pub const EXACT_MAX_SAMPLE: usize = 10_000;

/// How the KS p-value is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KsMethod {
    /// Exact when both samples have at most [`EXACT_MAX_SAMPLE`] values,
    /// asymptotic otherwise
    #[default]
    Auto,
    /// Exact two-sided distribution by lattice-path counting
    Exact,
    /// Kolmogorov limiting distribution
    Asymptotic,
}

impl KsMethod {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exact => "exact",
            Self::Asymptotic => "asymptotic",
        }
    }

    /// Concrete method for samples of size `m` and `n`.
    pub fn resolve(self, m: usize, n: usize) -> Self {
        match self {
            Self::Auto if m.max(n) <= EXACT_MAX_SAMPLE => Self::Exact,
            Self::Auto => Self::Asymptotic,
            other => other,
        }
    }
}

impl FromStr for KsMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "exact" => Ok(Self::Exact),
            "asymp" | "asymptotic" => Ok(Self::Asymptotic),
            other => Err(Error::invalid_config(format!(
                "unknown KS method '{}', expected auto, exact or asymptotic",
                other
            ))),
        }
    }
}

/// Result of a two-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsOutcome {
    /// Maximum distance between the empirical CDFs
    pub statistic: f64,
    /// Untruncated two-sided p-value
    pub p_value: f64,
    /// Method actually used
    pub method: KsMethod,
}

/// KS statistic `D = max |F1(x) - F2(x)|` of two samples.
///
/// Returns 0.0 when either sample is empty.
pub fn ks_statistic(first: &[f64], second: &[f64]) -> f64 {
    if first.is_empty() || second.is_empty() {
        return 0.0;
    }
    let gap = max_cdf_gap(&sorted(first), &sorted(second));
    gap as f64 / (first.len() as f64 * second.len() as f64)
}

/// Two-sided two-sample Kolmogorov-Smirnov test.
///
/// Returns `None` if either sample is empty.
pub fn ks_two_sample(first: &[f64], second: &[f64], method: KsMethod) -> Option<KsOutcome> {
    if first.is_empty() || second.is_empty() {
        return None;
    }

    let m = first.len();
    let n = second.len();
    let gap = max_cdf_gap(&sorted(first), &sorted(second));
    let statistic = gap as f64 / (m as f64 * n as f64);

    let method = method.resolve(m, n);
    let p_value = match method {
        KsMethod::Asymptotic => asymptotic_p_value(m, n, statistic),
        _ => exact_p_value(m, n, gap),
    };

    Some(KsOutcome {
        statistic,
        p_value,
        method,
    })
}

/// Run the KS test on each numerical column, in `columns` order.
///
/// Uses [`KsMethod::Auto`].
///
/// # Errors
///
/// Fails on the first column that is missing from either dataset or has an
/// empty sample on either side.
pub fn test_numerical<C, R, S>(
    comparison: &C,
    reference: &R,
    columns: &[S],
) -> Result<Vec<ColumnScore>>
where
    C: Dataset + ?Sized,
    R: Dataset + ?Sized,
    S: AsRef<str>,
{
    test_numerical_with(comparison, reference, columns, KsMethod::Auto)
}

/// [`test_numerical`] with an explicit p-value method.
///
/// # Errors
///
/// Same as [`test_numerical`].
pub fn test_numerical_with<C, R, S>(
    comparison: &C,
    reference: &R,
    columns: &[S],
    method: KsMethod,
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
            let x1 = numeric_sample(comparison, column, DatasetRole::Comparison)?;
            let x2 = numeric_sample(reference, column, DatasetRole::Reference)?;

            let outcome = ks_two_sample(&x1, &x2, method)
                .ok_or_else(|| Error::empty_sample(column, DatasetRole::Comparison))?;
            tracing::trace!(
                column,
                statistic = outcome.statistic,
                p_value = outcome.p_value,
                method = outcome.method.name(),
                "kolmogorov-smirnov"
            );
            Ok(ColumnScore::new(column, outcome.statistic, outcome.p_value))
        })
        .collect()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

/// Largest `|i * n - j * m|` over the merged samples, where `i` and `j`
/// count values `<= x` in each sample. Dividing by `m * n` gives `D`.
fn max_cdf_gap(first: &[f64], second: &[f64]) -> u128 {
    let m = first.len() as i128;
    let n = second.len() as i128;
    let (mut i, mut j) = (0usize, 0usize);
    let mut max_gap = 0u128;

    while i < first.len() || j < second.len() {
        let x = match (first.get(i), second.get(j)) {
            (Some(&a), Some(&b)) => a.min(b),
            (Some(&a), None) => a,
            (None, Some(&b)) => b,
            (None, None) => break,
        };
        // advance past ties on both sides before measuring
        while i < first.len() && first[i] <= x {
            i += 1;
        }
        while j < second.len() && second[j] <= x {
            j += 1;
        }
        let gap = (i as i128 * n - j as i128 * m).unsigned_abs();
        max_gap = max_gap.max(gap);
    }

    max_gap
}

/// Exact `P(D >= d)` for sample sizes `m`, `n`, with `d = gap / (m * n)`.
///
/// Walks the `(m + 1) x (n + 1)` lattice keeping, per cell, the fraction of
/// monotone paths from the origin that stay strictly inside the band
/// `|i * n - j * m| < gap`. Normalizing per cell keeps every value in
/// [0, 1], so no binomial coefficient is ever formed.
fn exact_p_value(m: usize, n: usize, gap: u128) -> f64 {
    if gap == 0 {
        return 1.0;
    }
    let gap = gap as i128;
    let inside = |i: usize, j: usize| (i as i128 * n as i128 - j as i128 * m as i128).abs() < gap;

    let mut row = vec![0.0_f64; n + 1];
    for i in 0..=m {
        for j in 0..=n {
            row[j] = if !inside(i, j) {
                0.0
            } else if i == 0 && j == 0 {
                1.0
            } else if i == 0 {
                row[j - 1]
            } else if j == 0 {
                row[j]
            } else {
                let total = (i + j) as f64;
                (i as f64 / total) * row[j] + (j as f64 / total) * row[j - 1]
            };
        }
    }

    (1.0 - row[n]).clamp(0.0, 1.0)
}

/// Asymptotic p-value with the small-sample correction to the effective size.
fn asymptotic_p_value(m: usize, n: usize, statistic: f64) -> f64 {
    let en = (m as f64 * n as f64) / (m + n) as f64;
    let sqrt_en = en.sqrt();
    kolmogorov_survival((sqrt_en + 0.12 + 0.11 / sqrt_en) * statistic)
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_survival(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z < 1.18 {
        // small-z series of the CDF converges in a handful of terms
        let y = (-PI * PI / (8.0 * z * z)).exp();
        let cdf = (2.0 * PI).sqrt() / z * (y + y.powi(9) + y.powi(25) + y.powi(49));
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let x = (-2.0 * z * z).exp();
        (2.0 * (x - x.powi(4) + x.powi(9))).clamp(0.0, 1.0)
    }
}
