//! Merging of per-tester scores into a [`DriftReport`].

use super::{ColumnDrift, ColumnScore, DriftReport, DriftTest, DEFAULT_ALPHA};

/// Truncate a p-value toward zero at two decimals.
///
/// `0.049999` becomes `0.04`, never `0.05`. Values outside [0, 1] are
/// clamped first and NaN maps to 0.
pub fn truncate_p_value(p_value: f64) -> f64 {
    if p_value.is_nan() {
        return 0.0;
    }
    (p_value.clamp(0.0, 1.0) * 100.0).floor() / 100.0
}

/// Build a report at [`DEFAULT_ALPHA`].
///
/// Categorical results come first, then numerical, each in the order given.
pub fn aggregate(
    numerical: impl IntoIterator<Item = ColumnScore>,
    categorical: impl IntoIterator<Item = ColumnScore>,
) -> DriftReport {
    aggregate_with_alpha(numerical, categorical, DEFAULT_ALPHA)
}

/// [`aggregate`] with an explicit significance level.
pub fn aggregate_with_alpha(
    numerical: impl IntoIterator<Item = ColumnScore>,
    categorical: impl IntoIterator<Item = ColumnScore>,
    alpha: f64,
) -> DriftReport {
    let columns = categorical
        .into_iter()
        .map(|score| ColumnDrift::from_score(score, DriftTest::ChiSquared, alpha))
        .chain(
            numerical
                .into_iter()
                .map(|score| ColumnDrift::from_score(score, DriftTest::KolmogorovSmirnov, alpha)),
        )
        .collect();

    DriftReport::from_columns(columns, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_p_value() {
        assert_eq!(truncate_p_value(0.05), 0.05);
        assert_eq!(truncate_p_value(0.049999), 0.04);
        assert_eq!(truncate_p_value(0.999), 0.99);
        assert_eq!(truncate_p_value(1.0), 1.0);
        assert_eq!(truncate_p_value(0.0), 0.0);
        assert_eq!(truncate_p_value(4.75e-27), 0.0);
    }

    #[test]
    fn test_truncate_p_value_out_of_range() {
        assert_eq!(truncate_p_value(1.5), 1.0);
        assert_eq!(truncate_p_value(-0.2), 0.0);
        assert_eq!(truncate_p_value(f64::NAN), 0.0);
    }

    #[test]
    fn test_aggregate_order_categorical_first() {
        let report = aggregate(
            vec![
                ColumnScore::new("age", 0.1, 0.3),
                ColumnScore::new("blood_pressure", 0.8, 0.0),
            ],
            vec![ColumnScore::new("sex", 0.0, 1.0)],
        );

        let order: Vec<(&str, DriftTest)> = report
            .iter()
            .map(|c| (c.column.as_str(), c.test))
            .collect();
        assert_eq!(
            order,
            vec![
                ("sex", DriftTest::ChiSquared),
                ("age", DriftTest::KolmogorovSmirnov),
                ("blood_pressure", DriftTest::KolmogorovSmirnov),
            ]
        );
        assert!(report.drift_detected);
        assert_eq!(report.drifted_columns(), vec!["blood_pressure"]);
        assert_eq!(report.alpha, DEFAULT_ALPHA);
    }

    #[test]
    fn test_aggregate_threshold_boundary() {
        let report = aggregate(
            vec![
                ColumnScore::new("at", 0.0, 0.05),
                ColumnScore::new("below", 0.0, 0.049999),
            ],
            Vec::new(),
        );

        assert_eq!(report.get("at").map(|c| c.drift_detected), Some(false));
        assert_eq!(report.get("below").map(|c| c.p_value), Some(0.04));
        assert_eq!(report.get("below").map(|c| c.drift_detected), Some(true));
    }

    #[test]
    fn test_aggregate_with_alpha() {
        let scores = || vec![ColumnScore::new("age", 0.1, 0.07)];

        assert!(!aggregate(scores(), Vec::new()).drift_detected);
        assert!(aggregate_with_alpha(scores(), Vec::new(), 0.1).drift_detected);
    }

    #[test]
    fn test_aggregate_empty() {
        let report = aggregate(Vec::new(), Vec::new());
        assert!(!report.drift_detected);
        assert_eq!(report.num_columns(), 0);
    }

    #[test]
    fn test_aggregate_deterministic() {
        let build = || {
            aggregate(
                vec![ColumnScore::new("age", 0.2, 0.5)],
                vec![ColumnScore::new("sex", 3.0, 0.01)],
            )
        };
        assert_eq!(build(), build());
    }
}
