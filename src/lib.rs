//! Fast linear algebra on pairwise distance matrices.
//!
//! Given `n` points in `d` dimensions, the distance matrix `D[k, j] =
//! dist(x_k, x_j)` has n² entries, but for the L1 and squared-L2 metrics the
//! product `D y` can be computed in O(n·d) without ever forming `D`. This crate
//! provides those implicit operators and a block Krylov truncated SVD that
//! consumes any operator through its products alone, so that a rank-k
//! approximation of `D` costs O(n·d) per iteration instead of O(n²).
//!
//! ## Operators
//!
//! **L1** ([`distance::L1DistanceMatrix`]): sorts every feature once
//! (O(n·d·log n)), then answers each query with prefix sums over the sorted
//! order. Queries before [`preprocess`](distance::L1DistanceMatrix::preprocess)
//! fail with [`error::DistMatErrorKind::NotPreprocessed`].
//!
//! **Squared L2** ([`distance::SquaredL2DistanceMatrix`]): uses
//! `‖a − b‖² = ‖a‖² + ‖b‖² − 2 a·b`; no precomputation.
//!
//! Both implement [`matrix::LinearOperator`], as do dense `faer` matrices.
//!
//! ## Solvers
//!
//! - [`block_krylov_svd`]: general (possibly rectangular) operators.
//! - [`symmetric_block_krylov_svd`]: symmetric operators such as distance
//!   matrices; advances blocks with `A²` instead of `AᵗA`.
//! - [`symmetric_block_krylov_svd_traced`]: as above, also recording the
//!   relative error against a reference after every iteration.
//!
//! ## Example Usage
//!
//! ```rust
//! use distmat_krylov::distance::{DistanceOperator, Metric, PointSet};
//! use distmat_krylov::symmetric_block_krylov_svd;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let points = PointSet::from_rows(&[
//!     [0.0, 1.0],
//!     [2.0, 0.5],
//!     [1.0, 3.0],
//!     [4.0, 2.0],
//!     [3.5, 0.0],
//!     [0.5, 2.5],
//! ])
//! .unwrap();
//!
//! let mut operator = DistanceOperator::new(points, Metric::L1);
//! operator.preprocess();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let svd = symmetric_block_krylov_svd(&operator, 2, 3, 3, &mut rng).unwrap();
//!
//! assert_eq!(svd.s.len(), 2);
//! assert!(svd.s[0] >= svd.s[1]);
//! ```

// Declare the modules that form the crate's API structure.
pub mod algorithms;
pub mod distance;
pub mod error;
pub mod matrix;
pub mod solvers;
pub mod utils;

// Re-export the main API for convenient access.
pub use algorithms::{ConvergenceRecord, ConvergenceTrace, LowRankFactorization};
pub use distance::{DistanceMatrix, DistanceOperator, Metric, PointSet};
pub use error::{DistMatError, DistMatErrorKind};
pub use solvers::{block_krylov_svd, symmetric_block_krylov_svd, symmetric_block_krylov_svd_traced};
