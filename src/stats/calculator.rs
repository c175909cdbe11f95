//! Statistics Calculator Module
//! Descriptive statistics of score samples and deltas between them.

use statrs::statistics::Statistics;

/// Descriptive statistics of a score sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl Default for ScoreSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            std: f64::NAN,
        }
    }
}

/// One displayed statistic, with its difference to the overall value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDelta {
    pub label: &'static str,
    pub value: f64,
    pub delta: Option<String>,
}

impl ScoreSummary {
    /// Labelled values in display order, excluding the participant count.
    pub fn metrics(&self) -> [(&'static str, f64); 5] {
        [
            ("Média", self.mean),
            ("Mediana", self.median),
            ("Mínimo", self.min),
            ("Máximo", self.max),
            ("Desvio Padrão", self.std),
        ]
    }

    /// Every statistic of `self` paired with its signed delta against `overall`.
    pub fn deltas_against(&self, overall: Option<&ScoreSummary>) -> Vec<MetricDelta> {
        let reference = overall.map(ScoreSummary::metrics);
        self.metrics()
            .iter()
            .enumerate()
            .map(|(i, &(label, value))| MetricDelta {
                label,
                value,
                delta: reference.and_then(|r| format_delta(value, r[i].1)),
            })
            .collect()
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn summarize(values: &[f64]) -> ScoreSummary {
        let n = values.len();
        if n == 0 {
            return ScoreSummary::default();
        }

        ScoreSummary {
            count: n,
            mean: Statistics::mean(values),
            median: Self::median(values),
            min: Statistics::min(values),
            max: Statistics::max(values),
            // Sample standard deviation; NaN for a single value
            std: Statistics::std_dev(values),
        }
    }

    pub fn median(values: &[f64]) -> f64 {
        Self::quantile(values, 0.5)
    }

    /// Quantile `q` in [0, 1] of unsorted values.
    pub fn quantile(values: &[f64], q: f64) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self::percentile(&sorted, q * 100.0)
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}

/// Signed two-decimal difference, or `None` when either side is NaN.
pub fn format_delta(value: f64, reference: f64) -> Option<String> {
    if value.is_nan() || reference.is_nan() {
        return None;
    }
    Some(format!("{:+.2}", value - reference))
}

/// Integer with `.` as thousands separator.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_two_scores() {
        let s = StatsCalculator::summarize(&[50.0, 70.0]);
        assert_eq!(s.count, 2);
        assert!((s.mean - 60.0).abs() < 1e-9);
        assert!((s.median - 60.0).abs() < 1e-9);
        assert_eq!(s.min, 50.0);
        assert_eq!(s.max, 70.0);
        assert!((s.std - 200f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty_is_nan() {
        let s = StatsCalculator::summarize(&[]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [40.0, 10.0, 30.0, 20.0];
        assert!((StatsCalculator::quantile(&values, 0.1) - 13.0).abs() < 1e-9);
        assert!((StatsCalculator::quantile(&values, 0.95) - 38.5).abs() < 1e-9);
        assert_eq!(StatsCalculator::median(&values), 25.0);
    }

    #[test]
    fn test_delta_formatting() {
        assert_eq!(format_delta(65.0, 60.0).as_deref(), Some("+5.00"));
        assert_eq!(format_delta(58.75, 60.0).as_deref(), Some("-1.25"));
        assert_eq!(format_delta(f64::NAN, 60.0), None);
    }

    #[test]
    fn test_deltas_against_overall() {
        let overall = ScoreSummary {
            mean: 60.0,
            ..StatsCalculator::summarize(&[50.0, 70.0])
        };
        let course = ScoreSummary {
            mean: 65.0,
            ..overall
        };
        let deltas = course.deltas_against(Some(&overall));
        assert_eq!(deltas[0].label, "Média");
        assert_eq!(deltas[0].delta.as_deref(), Some("+5.00"));
        assert_eq!(deltas[1].delta.as_deref(), Some("+0.00"));
        assert!(course.deltas_against(None).iter().all(|d| d.delta.is_none()));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(1234), "1.234");
        assert_eq!(format_count(1234567), "1.234.567");
    }
}
