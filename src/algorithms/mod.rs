//! Building blocks of the block Krylov SVD.
//!
//! ** NOTE: We recommend using the high-level functions in [`crate::solvers`]
//! instead. This module is intended for callers that need to drive the
//! iteration themselves, for example to inspect the subspace as it grows.
//!
//! The pieces are:
//! - [`KrylovParams`]: the three knobs of every solver, with validation.
//! - [`KrylovSubspace`]: the accumulator `K` that collects one orthonormal
//!   block per iteration.
//! - [`block_krylov::block_krylov_iteration`]: the iteration itself, generic
//!   over how a block is advanced (`AᵗA` or `A²`).
//! - [`project_svd`]: the Rayleigh–Ritz step, an exact SVD of `A Q` truncated
//!   to the target rank.
//! - [`LowRankFactorization`] and [`ConvergenceTrace`]: the results.

pub mod block_krylov;

use crate::{
    error::{DistMatError, DistMatErrorKind},
    matrix::LinearOperator,
};
use faer::{Mat, MatRef};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target rank, iteration count and block width of a block Krylov run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KrylovParams {
    /// Number of singular triples to return (`k`).
    pub rank: usize,
    /// Number of power iterations; each one adds a block to the subspace.
    pub num_iter: usize,
    /// Width of each Krylov block. Must be at least `rank`.
    pub block_size: usize,
}

impl KrylovParams {
    pub fn new(rank: usize, num_iter: usize, block_size: usize) -> Self {
        Self {
            rank,
            num_iter,
            block_size,
        }
    }

    /// Checks the parameters against an `nrows × ncols` operator.
    ///
    /// # Errors
    /// - [`DistMatErrorKind::RankExceedsBlockSize`] if `rank > block_size`.
    /// - [`DistMatErrorKind::InputError`] if `rank` or `num_iter` is zero, or
    ///   if a block would be wider than the operator's smaller dimension.
    pub fn validate(&self, nrows: usize, ncols: usize) -> Result<(), DistMatError> {
        if self.rank == 0 {
            return Err(input_error("`k` must be at least 1."));
        }
        if self.num_iter == 0 {
            return Err(input_error("`num_iter` must be at least 1."));
        }
        if self.rank > self.block_size {
            return Err(DistMatErrorKind::RankExceedsBlockSize {
                rank: self.rank,
                block_size: self.block_size,
            }
            .into());
        }
        let smaller = nrows.min(ncols);
        if self.block_size > smaller {
            return Err(input_error(&format!(
                "`block_size` ({}) exceeds the smaller dimension of the {nrows}x{ncols} operator.",
                self.block_size
            )));
        }
        Ok(())
    }
}

pub(crate) fn input_error(message: &str) -> DistMatError {
    DistMatErrorKind::InputError(message.to_string()).into()
}

/// The Krylov accumulator `K`, filled one orthonormal block per iteration.
#[derive(Debug, Clone)]
pub struct KrylovSubspace {
    columns: Mat<f64>,
    block_size: usize,
    blocks: usize,
}

impl KrylovSubspace {
    pub(crate) fn new(dim: usize, block_size: usize, num_iter: usize) -> Self {
        Self {
            columns: Mat::zeros(dim, block_size * num_iter),
            block_size,
            blocks: 0,
        }
    }

    /// Copies `block` (dim × block_size) into the next free column slice.
    pub(crate) fn push_block(&mut self, block: MatRef<'_, f64>) {
        let start = self.blocks * self.block_size;
        self.columns
            .as_mut()
            .get_mut(.., start..start + self.block_size)
            .copy_from(block);
        self.blocks += 1;
    }

    /// Number of blocks pushed so far.
    pub fn blocks_filled(&self) -> usize {
        self.blocks
    }

    /// View of the columns filled so far.
    pub fn filled_columns(&self) -> MatRef<'_, f64> {
        self.columns
            .as_ref()
            .get(.., 0..self.blocks * self.block_size)
    }

    /// Orthonormal basis `Q` of the columns filled so far.
    pub fn orthonormal_basis(&self) -> Mat<f64> {
        orthonormalize(self.filled_columns())
    }
}

/// State handed to the per-iteration callback of the block Krylov iteration.
pub struct KrylovStep<'a> {
    /// 0-based iteration index.
    pub iteration: usize,
    /// Wall time of this iteration's advance + orthonormalise step.
    pub elapsed: Duration,
    /// The accumulator, including this iteration's block.
    pub subspace: &'a KrylovSubspace,
}

/// Per-iteration hook. An error aborts the iteration and is returned to the caller.
pub type KrylovCallback<'a> = dyn FnMut(&KrylovStep<'_>) -> Result<(), DistMatError> + 'a;

/// A truncated SVD `A ≈ U · diag(S) · Vᵗ`.
#[derive(Debug, Clone, PartialEq)]
pub struct LowRankFactorization {
    /// Left singular vectors, one per column (nrows × k).
    pub u: Mat<f64>,
    /// Singular values, non-negative and non-increasing (length k).
    pub s: Vec<f64>,
    /// Right singular vectors, one per column (ncols × k).
    pub v: Mat<f64>,
}

impl LowRankFactorization {
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Computes the dense product `U · diag(S) · Vᵗ`.
    pub fn reconstruct(&self) -> Mat<f64> {
        let scaled_u = Mat::from_fn(self.u.nrows(), self.rank(), |r, c| {
            self.u[(r, c)] * self.s[c]
        });
        scaled_u.as_ref() * self.v.transpose()
    }

    /// The factorization of `Aᵗ`.
    pub(crate) fn transposed(self) -> Self {
        Self {
            u: self.v,
            s: self.s,
            v: self.u,
        }
    }
}

/// One row of a [`ConvergenceTrace`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    /// 0-based iteration index.
    pub iteration: usize,
    /// `‖U diag(S) Vᵗ − reference‖_F / denominator − 1` after this iteration.
    pub relative_error: f64,
    /// Wall time of the iteration's advance + orthonormalise step, in seconds.
    pub elapsed_s: f64,
}

/// Append-only per-iteration record of a traced run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceTrace {
    records: Vec<ConvergenceRecord>,
}

impl ConvergenceTrace {
    pub(crate) fn push(&mut self, record: ConvergenceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ConvergenceRecord] {
        &self.records
    }

    pub fn errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.relative_error)
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.elapsed_s)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A view of `Aᵗ` for an operator `A`.
pub(crate) struct Transposed<'a, O: ?Sized>(pub(crate) &'a O);

impl<O: LinearOperator + ?Sized> LinearOperator for Transposed<'_, O> {
    fn nrows(&self) -> usize {
        self.0.ncols()
    }

    fn ncols(&self) -> usize {
        self.0.nrows()
    }

    fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.0.apply_transpose(rhs)
    }

    fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.0.apply(rhs)
    }
}

/// Thin Householder QR, returning only `Q`.
pub(crate) fn orthonormalize(m: MatRef<'_, f64>) -> Mat<f64> {
    m.qr().compute_thin_Q()
}

/// A `rows × cols` matrix of independent standard normal entries.
pub(crate) fn gaussian_block<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Mat<f64> {
    Mat::from_fn(rows, cols, |_, _| rng.sample::<f64, _>(StandardNormal))
}

/// Rank-k SVD of `A Q`, lifted back through `Q`.
pub(crate) struct ProjectedSvd {
    /// Leading left singular vectors of `A Q` (nrows × k).
    pub left: Mat<f64>,
    pub singular_values: Vec<f64>,
    /// `Q` times the leading right singular vectors of `A Q` (ncols × k).
    pub right: Mat<f64>,
}

/// Projects `operator` onto the orthonormal columns of `q` and keeps the top `k` triples.
pub(crate) fn project_svd<O: LinearOperator + ?Sized>(
    operator: &O,
    q: MatRef<'_, f64>,
    k: usize,
) -> Result<ProjectedSvd, DistMatError> {
    let projected = operator.apply(q)?;
    let svd = projected
        .thin_svd()
        .map_err(|e| DistMatError::from(DistMatErrorKind::SvdError(e)))?;
    let (u, v) = (svd.U(), svd.V());
    let s = svd.S().column_vector();

    let available = s.nrows();
    if available < k {
        return Err(input_error(&format!(
            "only {available} singular values available for rank {k}."
        )));
    }

    // Sort explicitly so truncation keeps the largest triples.
    let mut order: Vec<usize> = (0..available).collect();
    order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));
    order.truncate(k);

    let left = Mat::from_fn(u.nrows(), k, |r, c| u[(r, order[c])]);
    let v_k = Mat::from_fn(v.nrows(), k, |r, c| v[(r, order[c])]);
    let right = q * v_k.as_ref();
    let singular_values = order.iter().map(|&j| s[j]).collect();

    Ok(ProjectedSvd {
        left,
        singular_values,
        right,
    })
}

/// `‖a − b‖_F` without allocating the difference.
pub(crate) fn frobenius_distance(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    let mut sum = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            let diff = a[(i, j)] - b[(i, j)];
            sum += diff * diff;
        }
    }
    sum.sqrt()
}
