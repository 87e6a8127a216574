//! Fast queries against an implicit squared-L2 distance matrix.
//!
//! With `‖a − b‖² = ‖a‖² + ‖b‖² − 2 a·b`, the query `z = D y` becomes
//!
//! ```text
//! z = (Σ_j y_j) · norms + (Σ_j norms_j y_j) · 1 − 2 X (Xᵗ y)
//! ```
//!
//! which is O(n·d) and needs no precomputation. Row norms are recomputed on
//! every query so the operator carries no state besides its points.

use super::{DistanceMatrix, PointSet};
use crate::error::{DistMatError, DistMatErrorKind};
use faer::{Col, ColRef};

/// Implicit squared Euclidean distance matrix over a point set.
#[derive(Debug, Clone)]
pub struct SquaredL2DistanceMatrix {
    points: PointSet,
}

impl SquaredL2DistanceMatrix {
    pub fn new(points: PointSet) -> Self {
        Self { points }
    }
}

impl DistanceMatrix for SquaredL2DistanceMatrix {
    fn points(&self) -> &PointSet {
        &self.points
    }

    fn query(&self, y: ColRef<'_, f64>) -> Result<Col<f64>, DistMatError> {
        let (n, d) = (self.points.nrows(), self.points.ncols());
        if y.nrows() != n {
            return Err(DistMatErrorKind::DimensionMismatch {
                operator_cols: n,
                operand_rows: y.nrows(),
            }
            .into());
        }

        let mut norms = vec![0.0; n];
        // projected[i] = (Xᵗ y)_i
        let mut projected = vec![0.0; d];
        for (i, proj) in projected.iter_mut().enumerate() {
            for (k, &x) in self.points.feature(i).iter().enumerate() {
                norms[k] += x * x;
                *proj += x * y[k];
            }
        }

        let weight_total: f64 = (0..n).map(|k| y[k]).sum();
        let weighted_norms: f64 = (0..n).map(|k| norms[k] * y[k]).sum();

        let mut cross = vec![0.0; n];
        for (i, &proj) in projected.iter().enumerate() {
            for (k, &x) in self.points.feature(i).iter().enumerate() {
                cross[k] += x * proj;
            }
        }

        Ok(Col::from_fn(n, |k| {
            weight_total * norms[k] + weighted_norms - 2.0 * cross[k]
        }))
    }
}
