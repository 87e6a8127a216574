//! This module defines the core abstraction for linear operators.
//!
//! The block Krylov solvers never read individual matrix entries. Their only
//! access to the operator is the product with a block of vectors, which allows
//! the same solver to run against a dense `faer` matrix or against an implicit
//! distance matrix that is never materialised.
//!
//! The central piece of this module is the [`LinearOperator`] trait, which
//! formalizes this contract. Unlike a plain matrix product, applying an operator
//! is fallible: a mismatched operand is reported as
//! [`DistMatErrorKind::DimensionMismatch`] instead of panicking, because the
//! distance operators surface it to the caller as a recoverable error.

use crate::error::{DistMatError, DistMatErrorKind};
use faer::{Mat, MatMut, MatRef, prelude::Reborrow};

/// Represents a real linear operator that can be applied to a block of vectors.
///
/// # Example
///
/// ```
/// use distmat_krylov::matrix::LinearOperator;
/// use faer::{Mat, mat};
///
/// let a: Mat<f64> = mat![[2.0, 1.0], [1.0, 3.0]];
/// let x: Mat<f64> = mat![[1.0], [1.0]];
///
/// let y = a.apply(x.as_ref()).unwrap();
/// assert_eq!(y, mat![[3.0], [4.0]]);
/// assert!(a.apply(Mat::<f64>::zeros(3, 1).as_ref()).is_err());
/// ```
pub trait LinearOperator {
    /// Returns the number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Computes `A * rhs`. `rhs` must have `self.ncols()` rows.
    fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError>;

    /// Computes `Aᵗ * rhs`. `rhs` must have `self.nrows()` rows.
    fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError>;
}

/// Fails with `DimensionMismatch` unless `rhs` has exactly `expected_rows` rows.
pub(crate) fn check_operand(expected_rows: usize, rhs: MatRef<'_, f64>) -> Result<(), DistMatError> {
    if rhs.nrows() != expected_rows {
        return Err(DistMatErrorKind::DimensionMismatch {
            operator_cols: expected_rows,
            operand_rows: rhs.nrows(),
        }
        .into());
    }
    Ok(())
}

/// Implementation of `LinearOperator` for `faer`'s immutable dense matrix view (`MatRef`).
impl<'a> LinearOperator for MatRef<'a, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        MatRef::nrows(self)
    }

    #[inline]
    fn ncols(&self) -> usize {
        MatRef::ncols(self)
    }

    fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        check_operand(MatRef::ncols(self), rhs)?;
        Ok(*self * rhs)
    }

    fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        check_operand(MatRef::nrows(self), rhs)?;
        Ok(self.transpose() * rhs)
    }
}

/// Delegates to the `MatRef` implementation via a reborrow.
impl<'a> LinearOperator for MatMut<'a, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.rb().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.rb().ncols()
    }

    fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.rb().apply(rhs)
    }

    fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.rb().apply_transpose(rhs)
    }
}

/// Delegates to the `MatRef` implementation via a view.
impl LinearOperator for Mat<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    fn apply(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.as_ref().apply(rhs)
    }

    fn apply_transpose(&self, rhs: MatRef<'_, f64>) -> Result<Mat<f64>, DistMatError> {
        self.as_ref().apply_transpose(rhs)
    }
}
