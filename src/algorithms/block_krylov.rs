//! The raw block Krylov iteration.
//!
//! Starting from a random Gaussian block with orthonormalised columns, every
//! iteration advances the block through the operator, re-orthonormalises it
//! with a thin QR and appends it to the [`KrylovSubspace`]. How a block is
//! advanced is left to the caller:
//!
//! - `Aᵗ (A X)` for a general rectangular operator,
//! - `A (A X)` for a symmetric one.
//!
//! Both keep the block in the operator's column space, so the accumulated
//! subspace approximates the dominant right singular directions. The QR after
//! every step keeps the block from collapsing onto the top singular vector.

use super::{KrylovCallback, KrylovParams, KrylovStep, KrylovSubspace, gaussian_block, orthonormalize};
use crate::error::DistMatError;
use faer::{Mat, MatRef};
use rand::Rng;
use std::time::Instant;

/// Runs `params.num_iter` block Krylov iterations in a space of dimension `dim`.
///
/// # Arguments
/// * `advance`: maps an orthonormal `dim × block_size` block to its image
///   under `AᵗA` (or `A²`). Errors from the operator abort the iteration.
/// * `dim`: number of columns of the operator.
/// * `params`: rank, iteration count and block width. Assumed validated.
/// * `rng`: source of the initial Gaussian block.
/// * `callback`: optional hook invoked after every iteration with the
///   subspace built so far and the time the iteration took.
///
/// # Returns
/// The filled [`KrylovSubspace`] with `params.num_iter` blocks.
pub fn block_krylov_iteration<F, R>(
    mut advance: F,
    dim: usize,
    params: &KrylovParams,
    rng: &mut R,
    mut callback: Option<&mut KrylovCallback<'_>>,
) -> Result<KrylovSubspace, DistMatError>
where
    F: FnMut(MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError>,
    R: Rng + ?Sized,
{
    let mut subspace = KrylovSubspace::new(dim, params.block_size, params.num_iter);
    let mut block = orthonormalize(gaussian_block(dim, params.block_size, rng).as_ref());

    for iteration in 0..params.num_iter {
        let start = Instant::now();

        let advanced = advance(block.as_ref())?;
        block = orthonormalize(advanced.as_ref());
        subspace.push_block(block.as_ref());

        let elapsed = start.elapsed();
        log::trace!(
            "block Krylov iteration {}/{} took {:.3e}s",
            iteration + 1,
            params.num_iter,
            elapsed.as_secs_f64()
        );

        if let Some(ref mut cb) = callback {
            cb(&KrylovStep {
                iteration,
                elapsed,
                subspace: &subspace,
            })?;
        }
    }

    Ok(subspace)
}
