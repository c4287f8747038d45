//! Candidate-to-identity matching.

use nalgebra::DMatrix;

use crate::appearance::AppearanceFingerprint;
use crate::distance::HistogramMetric;

/// Build the cost matrix between this frame's candidate fingerprints and the
/// registered fingerprints.
///
/// # Arguments
/// * `metric` - Histogram metric used for each pairwise cost
/// * `candidates` - Fingerprints of this frame's detections (rows)
/// * `registered` - Registered fingerprints in column order (columns)
///
/// # Returns
/// Cost matrix of shape (n_candidates, n_registered).
pub fn build_cost_matrix(
    metric: HistogramMetric,
    candidates: &[AppearanceFingerprint],
    registered: &[&AppearanceFingerprint],
) -> DMatrix<f64> {
    let mut costs = DMatrix::zeros(candidates.len(), registered.len());
    for (i, candidate) in candidates.iter().enumerate() {
        for (j, registered) in registered.iter().enumerate() {
            costs[(i, j)] = metric.cost(candidate, registered);
        }
    }
    costs
}

/// Find the first column of `row` whose cost is strictly below `threshold`,
/// scanning columns left to right.
///
/// This is first-fit rather than minimum-cost, and columns are not consumed:
/// the same column may win for several rows within one frame.
///
/// # Returns
/// The winning column index, or `None` if no cost clears the threshold.
pub fn first_below_threshold(costs: &DMatrix<f64>, row: usize, threshold: f64) -> Option<usize> {
    (0..costs.ncols()).find(|&j| costs[(row, j)] < threshold)
}
