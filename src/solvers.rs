//! This module provides the high-level API for computing truncated SVDs with
//! block Krylov iteration.
//!
//! All three solvers only ever touch the operator through [`LinearOperator`],
//! so they run unchanged on dense `faer` matrices and on the implicit distance
//! matrices of [`crate::distance`]. With an O(n·d) multiply, each iteration
//! costs O(n·d·block_size) instead of the O(n²·block_size) of a dense matrix.
//!
//! Randomness is always supplied by the caller; pass a seeded
//! [`rand::rngs::StdRng`] for reproducible results.

use crate::{
    algorithms::{
        ConvergenceRecord, ConvergenceTrace, KrylovCallback, KrylovParams, KrylovStep,
        LowRankFactorization, Transposed, block_krylov::block_krylov_iteration,
        frobenius_distance, input_error, project_svd,
    },
    error::DistMatError,
    matrix::LinearOperator,
};
use faer::MatRef;
use rand::Rng;

/// Computes a rank-`k` truncated SVD of a general operator.
///
/// The iteration runs on whichever of `A` and `Aᵗ` has at least as many rows
/// as columns, advancing blocks with `Aᵗ (A X)`; the factors are swapped back
/// before returning when `Aᵗ` was used.
///
/// # Arguments
/// * `operator`: any [`LinearOperator`], square or rectangular.
/// * `k`: number of singular triples to return.
/// * `num_iter`: number of power iterations.
/// * `block_size`: width of each Krylov block, `k ≤ block_size ≤ min(nrows, ncols)`.
/// * `rng`: source of the random starting block.
///
/// # Errors
/// Shape mismatch if `k > block_size` or the operator rejects an operand,
/// [`crate::error::DistMatErrorKind::InputError`] for other invalid
/// parameters, and SVD failures of the projected matrix.
pub fn block_krylov_svd<O, R>(
    operator: &O,
    k: usize,
    num_iter: usize,
    block_size: usize,
    rng: &mut R,
) -> Result<LowRankFactorization, DistMatError>
where
    O: LinearOperator + ?Sized,
    R: Rng + ?Sized,
{
    let params = KrylovParams::new(k, num_iter, block_size);
    params.validate(operator.nrows(), operator.ncols())?;
    log::debug!(
        "block Krylov SVD of a {}x{} operator: {params:?}",
        operator.nrows(),
        operator.ncols()
    );

    if operator.nrows() < operator.ncols() {
        let factorization = oriented_block_krylov_svd(&Transposed(operator), &params, rng)?;
        Ok(factorization.transposed())
    } else {
        oriented_block_krylov_svd(operator, &params, rng)
    }
}

/// [`block_krylov_svd`] for an operator with `nrows ≥ ncols`.
fn oriented_block_krylov_svd<O, R>(
    operator: &O,
    params: &KrylovParams,
    rng: &mut R,
) -> Result<LowRankFactorization, DistMatError>
where
    O: LinearOperator + ?Sized,
    R: Rng + ?Sized,
{
    let subspace = block_krylov_iteration(
        |block| {
            let image = operator.apply(block)?;
            operator.apply_transpose(image.as_ref())
        },
        operator.ncols(),
        params,
        rng,
        None,
    )?;

    let q = subspace.orthonormal_basis();
    let projected = project_svd(operator, q.as_ref(), params.rank)?;
    Ok(LowRankFactorization {
        u: projected.left,
        s: projected.singular_values,
        v: projected.right,
    })
}

/// Computes a rank-`k` truncated SVD of a symmetric operator.
///
/// Blocks are advanced with `A (A X)`, which equals `Aᵗ (A X)` when `A = Aᵗ`
/// and needs no transposed products. Symmetry is not checked; a non-square
/// operator is rejected by its own dimension check.
///
/// Arguments and errors are those of [`block_krylov_svd`].
pub fn symmetric_block_krylov_svd<O, R>(
    operator: &O,
    k: usize,
    num_iter: usize,
    block_size: usize,
    rng: &mut R,
) -> Result<LowRankFactorization, DistMatError>
where
    O: LinearOperator + ?Sized,
    R: Rng + ?Sized,
{
    let params = KrylovParams::new(k, num_iter, block_size);
    params.validate(operator.nrows(), operator.ncols())?;
    log::debug!(
        "symmetric block Krylov SVD of a {}x{} operator: {params:?}",
        operator.nrows(),
        operator.ncols()
    );

    let subspace = block_krylov_iteration(
        |block| square(operator, block),
        operator.ncols(),
        &params,
        rng,
        None,
    )?;
    symmetric_factorization(operator, &subspace.orthonormal_basis(), k)
}

/// [`symmetric_block_krylov_svd`] that also records how the approximation
/// converges.
///
/// After every iteration the rank-`k` factorization of the subspace built so
/// far is extracted, and `‖U diag(S) Vᵗ − reference‖_F / denominator − 1` is
/// appended to the trace together with the wall time of that iteration's
/// multiply + orthonormalise step. With `reference = A` and `denominator` the
/// optimal rank-`k` residual `‖A − A_k‖_F`, the recorded error is the excess
/// over the best possible approximation and tends to zero.
///
/// The extra SVD per iteration makes this variant slower; use it to study
/// convergence, not in production.
///
/// # Errors
/// Those of [`block_krylov_svd`], plus
/// [`crate::error::DistMatErrorKind::InputError`] if `reference` does not
/// have the operator's shape or `denominator` is not a positive finite number.
#[allow(clippy::too_many_arguments)]
pub fn symmetric_block_krylov_svd_traced<O, R>(
    operator: &O,
    k: usize,
    num_iter: usize,
    block_size: usize,
    reference: MatRef<'_, f64>,
    denominator: f64,
    rng: &mut R,
) -> Result<(LowRankFactorization, ConvergenceTrace), DistMatError>
where
    O: LinearOperator + ?Sized,
    R: Rng + ?Sized,
{
    let params = KrylovParams::new(k, num_iter, block_size);
    params.validate(operator.nrows(), operator.ncols())?;
    if (reference.nrows(), reference.ncols()) != (operator.nrows(), operator.ncols()) {
        return Err(input_error(&format!(
            "reference is {}x{} but the operator is {}x{}.",
            reference.nrows(),
            reference.ncols(),
            operator.nrows(),
            operator.ncols()
        )));
    }
    if !(denominator.is_finite() && denominator > 0.0) {
        return Err(input_error(&format!(
            "`denominator` must be positive and finite, got {denominator}."
        )));
    }

    let mut trace = ConvergenceTrace::default();
    let mut record = |step: &KrylovStep<'_>| -> Result<(), DistMatError> {
        let intermediate =
            symmetric_factorization(operator, &step.subspace.orthonormal_basis(), k)?;
        let residual = frobenius_distance(intermediate.reconstruct().as_ref(), reference);
        let relative_error = residual / denominator - 1.0;
        log::trace!(
            "iteration {}: relative error {relative_error:.6e}",
            step.iteration
        );
        trace.push(ConvergenceRecord {
            iteration: step.iteration,
            relative_error,
            elapsed_s: step.elapsed.as_secs_f64(),
        });
        Ok(())
    };
    let callback: &mut KrylovCallback<'_> = &mut record;

    let subspace = block_krylov_iteration(
        |block| square(operator, block),
        operator.ncols(),
        &params,
        rng,
        Some(callback),
    )?;
    let factorization = symmetric_factorization(operator, &subspace.orthonormal_basis(), k)?;

    Ok((factorization, trace))
}

/// `A (A X)`.
fn square<O: LinearOperator + ?Sized>(
    operator: &O,
    block: MatRef<'_, f64>,
) -> Result<faer::Mat<f64>, DistMatError> {
    let image = operator.apply(block)?;
    operator.apply(image.as_ref())
}

fn symmetric_factorization<O: LinearOperator + ?Sized>(
    operator: &O,
    q: &faer::Mat<f64>,
    k: usize,
) -> Result<LowRankFactorization, DistMatError> {
    let projected = project_svd(operator, q.as_ref(), k)?;
    Ok(LowRankFactorization {
        u: projected.left,
        s: projected.singular_values,
        v: projected.right,
    })
}
