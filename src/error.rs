//! This module defines the custom error types for the library.
//!
//! Every failure the distance operators and the Krylov solvers can report is
//! collected into a single enum, [`DistMatErrorKind`], wrapped by the public
//! [`DistMatError`]. Failures are immediate and terminal for the call: nothing
//! is retried and no partial result is returned.
//!
//! Note that [`faer::linalg::svd::SvdError`] does not implement the standard
//! [`std::error::Error`] trait, so it is wrapped manually.
use thiserror::Error;

/// Represents all possible errors raised by the distance operators and solvers.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct DistMatError(#[from] DistMatErrorKind);

impl DistMatError {
    /// Returns the kind of failure, for callers that need to branch on it.
    pub fn kind(&self) -> &DistMatErrorKind {
        &self.0
    }

    /// `true` for both flavours of shape mismatch: a bad operand row count or
    /// a target rank that does not fit in the Krylov block.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self.0,
            DistMatErrorKind::DimensionMismatch { .. } | DistMatErrorKind::RankExceedsBlockSize { .. }
        )
    }
}

/// The distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub enum DistMatErrorKind {
    /// The operand handed to a multiplication does not have as many rows as
    /// the operator has columns.
    #[error(
        "Dimension mismatch: operator has {operator_cols} columns but operand has {operand_rows} rows."
    )]
    DimensionMismatch {
        operator_cols: usize,
        operand_rows: usize,
    },

    /// The requested rank cannot be extracted from blocks of the given width.
    #[error("Requested rank {rank} exceeds the Krylov block size {block_size}.")]
    RankExceedsBlockSize { rank: usize, block_size: usize },

    /// An L1 distance matrix was queried before its order statistics were built.
    #[error("L1 distance matrix queried before preprocess() was called.")]
    NotPreprocessed,

    /// The point set is empty, has no features, or has rows of unequal length.
    #[error("Invalid point set: {0}")]
    InvalidPoints(String),

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Wraps an error originating from [`faer`]'s SVD module.
    #[error("A numerical error occurred during the SVD of the projected matrix: {0:?}")]
    SvdError(faer::linalg::svd::SvdError),
}

// Manually implement PartialEq for the public error type.
// We compare the inner `DistMatErrorKind`.
impl PartialEq for DistMatError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
