//! Implicit pairwise distance matrices.
//!
//! For a point set `X` (n×d) and a metric `dist`, the distance matrix `D` is
//! the n×n matrix with `D[k, j] = dist(x_k, x_j)`. The operators in this module
//! never build `D`. They answer the query `z = D y` directly from the points in
//! O(n·d) time:
//!
//! - [`L1DistanceMatrix`]: separable Manhattan distance, using per-feature order
//!   statistics computed once by [`L1DistanceMatrix::preprocess`].
//! - [`SquaredL2DistanceMatrix`]: squared Euclidean distance through the
//!   expansion `‖a − b‖² = ‖a‖² + ‖b‖² − 2 a·b`, with no precomputation.
//!
//! Both are symmetric, so they implement [`LinearOperator`] with
//! `apply_transpose == apply` and can be passed to any solver in
//! [`crate::solvers`].
//!
//! [`dense_distance_matrix`] materialises `D` by brute force. It exists for
//! validation and as a baseline in experiments.

pub mod l1;
pub mod points;
pub mod squared_l2;

pub use l1::{L1DistanceMatrix, OrderStatistics};
pub use points::PointSet;
pub use squared_l2::SquaredL2DistanceMatrix;

use crate::{
    error::DistMatError,
    matrix::{LinearOperator, check_operand},
};
use faer::{Col, ColRef, Mat, MatRef};
use serde::{Deserialize, Serialize};

/// The distance functions supported by the implicit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Manhattan distance, `Σ_i |a_i − b_i|`.
    L1,
    /// Squared Euclidean distance, `Σ_i (a_i − b_i)²`.
    SquaredL2,
}

impl Metric {
    /// Brute-force distance between points `a` and `b` of `points`.
    pub fn distance(&self, points: &PointSet, a: usize, b: usize) -> f64 {
        (0..points.ncols())
            .map(|i| {
                let diff = points.value(a, i) - points.value(b, i);
                match self {
                    Metric::L1 => diff.abs(),
                    Metric::SquaredL2 => diff * diff,
                }
            })
            .sum()
    }
}

/// The base contract shared by all implicit distance matrices.
///
/// Implementors provide [`query`](DistanceMatrix::query); the matrix product
/// is always assembled from one query per column and never touches more than
/// one length-n vector of `D` at a time.
pub trait DistanceMatrix {
    /// The point set the matrix is defined over.
    fn points(&self) -> &PointSet;

    /// Computes `z[k] = Σ_j dist(x_k, x_j) · y[j]`.
    ///
    /// # Errors
    /// [`crate::error::DistMatErrorKind::DimensionMismatch`] if `y` does not
    /// have one entry per point, plus any variant-specific precondition fault.
    fn query(&self, y: ColRef<'_, f64>) -> Result<Col<f64>, DistMatError>;

    /// Always `(n, n)`.
    fn shape(&self) -> (usize, usize) {
        let n = self.points().nrows();
        (n, n)
    }

    /// Computes `D * rhs` column by column.
    fn multiply_matrix(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        let (n, _) = self.shape();
        check_operand(n, rhs)?;

        let mut out = Mat::<f64>::zeros(n, rhs.ncols());
        for j in 0..rhs.ncols() {
            let z = self.query(rhs.col(j))?;
            out.col_mut(j).copy_from(z.as_ref());
        }
        Ok(out)
    }
}

/// Materialises the full n×n distance matrix. O(n²·d) time and O(n²) memory.
pub fn dense_distance_matrix(points: &PointSet, metric: Metric) -> Mat<f64> {
    let n = points.nrows();
    Mat::from_fn(n, n, |a, b| metric.distance(points, a, b))
}

/// A distance matrix whose metric is chosen at runtime.
#[derive(Debug, Clone)]
pub enum DistanceOperator {
    L1(L1DistanceMatrix),
    SquaredL2(SquaredL2DistanceMatrix),
}

impl DistanceOperator {
    /// Wraps `points` in the operator for `metric`.
    ///
    /// An L1 operator still needs [`preprocess`](Self::preprocess) before its
    /// first query.
    pub fn new(points: PointSet, metric: Metric) -> Self {
        match metric {
            Metric::L1 => Self::L1(L1DistanceMatrix::new(points)),
            Metric::SquaredL2 => Self::SquaredL2(SquaredL2DistanceMatrix::new(points)),
        }
    }

    /// Builds any auxiliary state the metric needs. A no-op for squared L2.
    pub fn preprocess(&mut self) {
        if let Self::L1(op) = self {
            op.preprocess();
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            Self::L1(_) => Metric::L1,
            Self::SquaredL2(_) => Metric::SquaredL2,
        }
    }
}

impl DistanceMatrix for DistanceOperator {
    fn points(&self) -> &PointSet {
        match self {
            Self::L1(op) => op.points(),
            Self::SquaredL2(op) => op.points(),
        }
    }

    fn query(&self, y: ColRef<'_, f64>) -> Result<Col<f64>, DistMatError> {
        match self {
            Self::L1(op) => op.query(y),
            Self::SquaredL2(op) => op.query(y),
        }
    }
}

/// Implements [`LinearOperator`] for a symmetric [`DistanceMatrix`].
macro_rules! impl_symmetric_operator {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LinearOperator for $ty {
                #[inline]
                fn nrows(&self) -> usize {
                    self.shape().0
                }

                #[inline]
                fn ncols(&self) -> usize {
                    self.shape().1
                }

                fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
                    self.multiply_matrix(rhs)
                }

                fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
                    self.multiply_matrix(rhs)
                }
            }
        )*
    };
}

impl_symmetric_operator!(L1DistanceMatrix, SquaredL2DistanceMatrix, DistanceOperator);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DistMatErrorKind;
    use faer::mat;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_points(n: usize, d: usize, seed: u64) -> PointSet {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|_| (0..d).map(|_| rng.random_range(-5.0..5.0)).collect())
            .collect();
        PointSet::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_dense_matrices_are_symmetric_with_zero_diagonal() {
        let points = random_points(12, 4, 7);
        for metric in [Metric::L1, Metric::SquaredL2] {
            let d = dense_distance_matrix(&points, metric);
            for a in 0..12 {
                assert_eq!(d[(a, a)], 0.0);
                for b in 0..12 {
                    assert_eq!(d[(a, b)], d[(b, a)]);
                    assert!(d[(a, b)] >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_end_to_end_line_of_three_points() {
        let points = PointSet::from_rows(&[[0.0], [1.0], [3.0]]).unwrap();
        let dense = dense_distance_matrix(&points, Metric::L1);
        assert_eq!(dense, mat![[0.0, 1.0, 3.0], [1.0, 0.0, 2.0], [3.0, 2.0, 0.0]]);

        let mut op = DistanceOperator::new(points, Metric::L1);
        op.preprocess();
        let ones = Mat::<f64>::from_fn(3, 1, |_, _| 1.0);
        let z = op.multiply_matrix(ones.as_ref()).unwrap();
        assert_eq!(z, mat![[4.0], [3.0], [5.0]]);
        assert_eq!(&dense * &ones, z);
    }

    #[test]
    fn test_operator_enum_matches_brute_force() {
        let points = random_points(20, 3, 11);
        let mut rng = StdRng::seed_from_u64(3);
        let y = Mat::<f64>::from_fn(20, 2, |_, _| rng.random_range(-1.0..1.0));

        for metric in [Metric::L1, Metric::SquaredL2] {
            let expected = &dense_distance_matrix(&points, metric) * &y;
            let mut op = DistanceOperator::new(points.clone(), metric);
            op.preprocess();
            assert_eq!(op.metric(), metric);
            assert_eq!(LinearOperator::nrows(&op), 20);

            let got = op.apply(y.as_ref()).unwrap();
            let err = (&got - &expected).norm_l2() / expected.norm_l2();
            assert!(err < 1e-12, "{metric:?} relative error {err}");
            assert_eq!(op.apply_transpose(y.as_ref()).unwrap(), got);
        }
    }

    #[test]
    fn test_multiply_matrix_rejects_every_mismatched_shape() {
        let points = random_points(6, 2, 5);
        for metric in [Metric::L1, Metric::SquaredL2] {
            let mut op = DistanceOperator::new(points.clone(), metric);
            op.preprocess();
            for rows in [0, 1, 5, 7, 12] {
                let b = Mat::<f64>::zeros(rows, 2);
                let err = op.multiply_matrix(b.as_ref()).unwrap_err();
                assert_eq!(
                    err.kind(),
                    &DistMatErrorKind::DimensionMismatch {
                        operator_cols: 6,
                        operand_rows: rows,
                    }
                );
            }
        }
    }

    #[test]
    fn test_unpreprocessed_l1_operator_faults() {
        let op = DistanceOperator::new(random_points(4, 2, 1), Metric::L1);
        let y = Mat::<f64>::zeros(4, 1);
        let err = op.multiply_matrix(y.as_ref()).unwrap_err();
        assert_eq!(err.kind(), &DistMatErrorKind::NotPreprocessed);
    }
}
