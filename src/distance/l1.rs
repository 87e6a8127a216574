//! Fast queries against an implicit L1 (Manhattan) distance matrix.
//!
//! The L1 distance is separable, `|a − b|₁ = Σ_i |a_i − b_i|`, so a query
//! `z = D y` splits into one independent problem per feature. For a single
//! feature with values sorted as `v_(0) ≤ … ≤ v_(n−1)`, the point at rank `q`
//! satisfies
//!
//! ```text
//! Σ_j |v_q − v_j| y_j = v_q (C_q − (C_total − C_q)) + (B_total − B_q) − B_q
//! ```
//!
//! where `B` and `C` are running sums, in sorted order, of `v_j y_j` and `y_j`.
//! Sorting every feature once ([`L1DistanceMatrix::preprocess`]) costs
//! O(n·d·log n). Each query afterwards is O(n·d) instead of O(n²·d).

use super::{DistanceMatrix, PointSet};
use crate::error::{DistMatError, DistMatErrorKind};
use faer::{Col, ColRef};

/// Per-feature order statistics of a point set.
///
/// For every feature `i`, `sorted_index(·, i)` lists points by increasing
/// value and `rank(·, i)` is its inverse permutation. Ties are broken by point
/// index; any order would do since equal coordinates are at distance zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatistics {
    /// Column-major n×d: entry `(r, i)` is the point with the r-th smallest feature `i`.
    sorted: Vec<usize>,
    /// Column-major n×d: entry `(k, i)` is the rank of point `k` in feature `i`.
    rank: Vec<usize>,
    n: usize,
}

impl OrderStatistics {
    fn compute(points: &PointSet) -> Self {
        let (n, d) = (points.nrows(), points.ncols());
        let mut sorted = Vec::with_capacity(n * d);
        let mut rank = vec![0; n * d];

        for i in 0..d {
            let values = points.feature(i);
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

            for (r, &k) in order.iter().enumerate() {
                rank[i * n + k] = r;
            }
            sorted.extend(order);
        }

        Self { sorted, rank, n }
    }

    /// The point holding the `r`-th smallest value of feature `i`.
    #[inline]
    pub fn sorted_index(&self, r: usize, i: usize) -> usize {
        self.sorted[i * self.n + r]
    }

    /// The 0-indexed position of point `k` when sorted by feature `i`.
    #[inline]
    pub fn rank(&self, k: usize, i: usize) -> usize {
        self.rank[i * self.n + k]
    }

    #[inline]
    fn sorted_feature(&self, i: usize) -> &[usize] {
        &self.sorted[i * self.n..(i + 1) * self.n]
    }
}

/// Implicit L1 distance matrix over a point set.
///
/// Queries fail with [`DistMatErrorKind::NotPreprocessed`] until
/// [`preprocess`](Self::preprocess) has been called. Once preprocessed the
/// operator is read-only and can be shared between threads.
#[derive(Debug, Clone)]
pub struct L1DistanceMatrix {
    points: PointSet,
    order: Option<OrderStatistics>,
}

impl L1DistanceMatrix {
    pub fn new(points: PointSet) -> Self {
        Self {
            points,
            order: None,
        }
    }

    /// Convenience constructor that also runs [`preprocess`](Self::preprocess).
    pub fn preprocessed(points: PointSet) -> Self {
        let mut op = Self::new(points);
        op.preprocess();
        op
    }

    /// Sorts every feature and stores the resulting order statistics.
    ///
    /// Calling it again recomputes the same arrays.
    pub fn preprocess(&mut self) {
        self.order = Some(OrderStatistics::compute(&self.points));
        log::debug!(
            "L1 order statistics built for {} points x {} features",
            self.points.nrows(),
            self.points.ncols()
        );
    }

    pub fn is_preprocessed(&self) -> bool {
        self.order.is_some()
    }

    pub fn order_statistics(&self) -> Option<&OrderStatistics> {
        self.order.as_ref()
    }
}

impl DistanceMatrix for L1DistanceMatrix {
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
        let order = self.order.as_ref().ok_or(DistMatErrorKind::NotPreprocessed)?;

        // Running sums in sorted order, column-major n×d like the points.
        let mut weighted_sums = vec![0.0; n * d];
        let mut weight_sums = vec![0.0; n * d];
        for i in 0..d {
            let values = self.points.feature(i);
            let mut weighted = 0.0;
            let mut weight = 0.0;
            for (r, &k) in order.sorted_feature(i).iter().enumerate() {
                weighted += values[k] * y[k];
                weight += y[k];
                weighted_sums[i * n + r] = weighted;
                weight_sums[i * n + r] = weight;
            }
        }

        let mut z = vec![0.0; n];
        accumulate_l1(
            self.points.as_slice(),
            &order.rank,
            &weighted_sums,
            &weight_sums,
            n,
            d,
            &mut z,
        );
        Ok(Col::from_fn(n, |k| z[k]))
    }
}

/// The hot loop of the L1 query.
///
/// All arrays are column-major n×d. For every point `k` and feature `i`, with
/// `q` the rank of `k` in feature `i`, adds
/// `x[k,i] (S3 − S4) + S2 − S1` to `z[k]`, where `S1`, `S3` are the running
/// sums up to and including rank `q` and `S2`, `S4` the remainders.
#[inline(never)]
fn accumulate_l1(
    points: &[f64],
    rank: &[usize],
    weighted_sums: &[f64],
    weight_sums: &[f64],
    n: usize,
    d: usize,
    z: &mut [f64],
) {
    let last = n - 1;
    for (k, out) in z.iter_mut().enumerate() {
        let mut acc = 0.0;
        for i in 0..d {
            let col = i * n;
            let q = rank[col + k];
            let s1 = weighted_sums[col + q];
            let s2 = weighted_sums[col + last] - s1;
            let s3 = weight_sums[col + q];
            let s4 = weight_sums[col + last] - s3;
            acc += points[col + k] * (s3 - s4) + s2 - s1;
        }
        *out = acc;
    }
}
