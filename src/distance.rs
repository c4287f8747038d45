//! Histogram dissimilarity metrics.
//!
//! All metrics are costs: 0 means identical appearance, larger means more
//! dissimilar. Bhattacharyya and intersection lie in [0, 1] for normalized
//! fingerprints, which keeps one matching threshold meaningful across both.

use crate::appearance::AppearanceFingerprint;
use crate::{Error, Result};

/// Built-in histogram metrics (enum-based static dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistogramMetric {
    /// Bhattacharyya distance, the reference metric for appearance matching.
    #[default]
    Bhattacharyya,
    /// One minus the histogram intersection.
    Intersection,
    /// Symmetric chi-square statistic (unbounded above).
    ChiSquare,
}

impl HistogramMetric {
    /// Cost between two fingerprints of the same shape.
    pub fn cost(&self, a: &AppearanceFingerprint, b: &AppearanceFingerprint) -> f64 {
        match self {
            HistogramMetric::Bhattacharyya => bhattacharyya(a, b),
            HistogramMetric::Intersection => intersection_cost(a, b),
            HistogramMetric::ChiSquare => chi_square(a, b),
        }
    }

    /// Canonical name accepted by [`metric_by_name`].
    pub fn name(&self) -> &'static str {
        match self {
            HistogramMetric::Bhattacharyya => "bhattacharyya",
            HistogramMetric::Intersection => "intersection",
            HistogramMetric::ChiSquare => "chi_square",
        }
    }
}

/// Bhattacharyya distance between two normalized histograms:
/// `sqrt(1 - sum(sqrt(p_i * q_i)))`, clamped at zero before the square root.
pub fn bhattacharyya(a: &AppearanceFingerprint, b: &AppearanceFingerprint) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    let coefficient: f64 = a
        .bins
        .iter()
        .zip(b.bins.iter())
        .map(|(&p, &q)| (p * q).sqrt())
        .sum();
    (1.0 - coefficient).max(0.0).sqrt()
}

/// Intersection cost: `1 - sum(min(p_i, q_i))`.
pub fn intersection_cost(a: &AppearanceFingerprint, b: &AppearanceFingerprint) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    let overlap: f64 = a
        .bins
        .iter()
        .zip(b.bins.iter())
        .map(|(&p, &q)| p.min(q))
        .sum();
    1.0 - overlap
}

/// Symmetric chi-square statistic: `sum((p_i - q_i)^2 / (p_i + q_i))` over
/// bins with any mass.
pub fn chi_square(a: &AppearanceFingerprint, b: &AppearanceFingerprint) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    a.bins
        .iter()
        .zip(b.bins.iter())
        .filter(|(&p, &q)| p + q > 0.0)
        .map(|(&p, &q)| (p - q).powi(2) / (p + q))
        .sum()
}

/// Look up a metric by name.
///
/// # Panics
/// Panics if the name is not recognized. Use [`try_metric_by_name`] for a
/// fallible lookup.
pub fn metric_by_name(name: &str) -> HistogramMetric {
    try_metric_by_name(name).unwrap_or_else(|e| panic!("{}", e))
}

/// Look up a metric by name, returning [`Error::UnknownMetric`] on failure.
pub fn try_metric_by_name(name: &str) -> Result<HistogramMetric> {
    match name {
        "bhattacharyya" => Ok(HistogramMetric::Bhattacharyya),
        "intersection" => Ok(HistogramMetric::Intersection),
        "chi_square" | "chisquare" => Ok(HistogramMetric::ChiSquare),
        _ => Err(Error::UnknownMetric(name.to_string())),
    }
}
