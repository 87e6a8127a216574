//! Integration test suite to verify the mathematical correctness of the
//! implicit distance operators and the block Krylov solvers.
//!
//! # Test Methodology
//!
//! The implicit operators are validated against a brute-force ground truth:
//! 1.  **Construct a Point Set:** random points with a fixed seed.
//! 2.  **Compute the Ground Truth:** materialise the n×n distance matrix `D`
//!     pairwise and form `D y` with a dense product.
//! 3.  **Compute the Implicit Product:** run the O(n·d) query of the operator.
//! 4.  **Verify Accuracy:** the relative error `‖z − D y‖ / ‖D y‖` must be at
//!     floating-point level.
//!
//! The solvers are validated through properties that hold for any input:
//! the number and ordering of singular values, orthonormality of both
//! factors, agreement with an exact SVD when the Krylov subspace covers the
//! whole space, and convergence of the traced error as iterations grow.

use anyhow::{Result, anyhow, ensure};
use distmat_krylov::{
    DistanceMatrix, DistanceOperator, LowRankFactorization, Metric, PointSet,
    block_krylov_svd, distance::dense_distance_matrix, symmetric_block_krylov_svd,
    symmetric_block_krylov_svd_traced,
};
use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Tolerance for the implicit products against the brute-force ground truth.
///
/// Both sides compute the same sums in a different order, so the difference
/// is pure rounding.
const PRODUCT_TOLERANCE: f64 = 1e-11;

/// Tolerance for `UᵗU = I` and `VᵗV = I`.
const ORTHONORMALITY_TOLERANCE: f64 = 1e-10;

fn random_points(n: usize, d: usize, rng: &mut StdRng) -> PointSet {
    let values = Mat::from_fn(n, d, |_, _| rng.random_range(-10.0..10.0));
    PointSet::from_mat(values.as_ref()).unwrap()
}

fn preprocessed(points: PointSet, metric: Metric) -> DistanceOperator {
    let mut operator = DistanceOperator::new(points, metric);
    operator.preprocess();
    operator
}

fn orthonormality_defect(m: &Mat<f64>) -> f64 {
    let gram = m.transpose() * m.as_ref();
    let mut worst = 0.0_f64;
    for i in 0..gram.nrows() {
        for j in 0..gram.ncols() {
            let expected = if i == j { 1.0 } else { 0.0 };
            worst = worst.max((gram[(i, j)] - expected).abs());
        }
    }
    worst
}

fn check_factorization(f: &LowRankFactorization, k: usize, label: &str) -> Result<()> {
    ensure!(f.s.len() == k, "{label}: expected {k} singular values, got {}", f.s.len());
    ensure!(
        f.s.windows(2).all(|w| w[0] >= w[1]),
        "{label}: singular values not sorted: {:?}",
        f.s
    );
    ensure!(f.s.iter().all(|&s| s >= 0.0), "{label}: negative singular value");
    let (du, dv) = (orthonormality_defect(&f.u), orthonormality_defect(&f.v));
    ensure!(
        du < ORTHONORMALITY_TOLERANCE && dv < ORTHONORMALITY_TOLERANCE,
        "{label}: orthonormality defects U {du:e}, V {dv:e}"
    );
    Ok(())
}

/// A macro to generate one implicit-vs-brute-force test per (metric, n, d).
macro_rules! generate_product_test {
    ($test_name:ident, $metric:expr, $n:expr, $d:expr) => {
        #[test]
        fn $test_name() -> Result<()> {
            let mut rng = StdRng::seed_from_u64(($n * 100 + $d) as u64);
            let points = random_points($n, $d, &mut rng);
            let y = Mat::<f64>::from_fn($n, 4, |_, _| rng.random_range(-1.0..1.0));

            let expected = &dense_distance_matrix(&points, $metric) * &y;
            let operator = preprocessed(points, $metric);
            let z = operator.multiply_matrix(y.as_ref())?;

            let rel_err = (&z - &expected).norm_l2() / expected.norm_l2();
            ensure!(
                rel_err < PRODUCT_TOLERANCE,
                "{:?} n={} d={}: relative error {}",
                $metric,
                $n,
                $d,
                rel_err
            );
            Ok(())
        }
    };
}

// --- Implicit products ---
generate_product_test!(test_l1_product_n5_d1, Metric::L1, 5, 1);
generate_product_test!(test_l1_product_n17_d3, Metric::L1, 17, 3);
generate_product_test!(test_l1_product_n50_d10, Metric::L1, 50, 10);
generate_product_test!(test_squared_l2_product_n5_d1, Metric::SquaredL2, 5, 1);
generate_product_test!(test_squared_l2_product_n17_d3, Metric::SquaredL2, 17, 3);
generate_product_test!(test_squared_l2_product_n50_d10, Metric::SquaredL2, 50, 10);

#[test]
fn test_end_to_end_three_points_on_a_line() -> Result<()> {
    let points = PointSet::from_rows(&[[0.0], [1.0], [3.0]])?;
    let dense = dense_distance_matrix(&points, Metric::L1);
    ensure!(dense == faer::mat![[0.0, 1.0, 3.0], [1.0, 0.0, 2.0], [3.0, 2.0, 0.0]]);

    let ones = Mat::<f64>::from_fn(3, 1, |_, _| 1.0);
    let expected = faer::mat![[4.0], [3.0], [5.0]];
    ensure!(&dense * &ones == expected);
    let operator = preprocessed(points, Metric::L1);
    ensure!(operator.multiply_matrix(ones.as_ref())? == expected);
    Ok(())
}

#[test]
fn test_shape_mismatch_on_every_wrong_row_count() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(1);
    for metric in [Metric::L1, Metric::SquaredL2] {
        let operator = preprocessed(random_points(9, 2, &mut rng), metric);
        for rows in (0..20).filter(|&r| r != 9) {
            let b = Mat::<f64>::zeros(rows, 3);
            let err = operator
                .multiply_matrix(b.as_ref())
                .err()
                .ok_or_else(|| anyhow!("{metric:?}: {rows} rows accepted"))?;
            ensure!(err.is_shape_mismatch());
        }
    }
    Ok(())
}

// --- Solvers on distance operators ---

#[test]
fn test_every_solver_returns_rank_k_orthonormal_factors() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(77);
    let points = random_points(40, 4, &mut rng);

    for metric in [Metric::L1, Metric::SquaredL2] {
        let dense = dense_distance_matrix(&points, metric);
        let operator = preprocessed(points.clone(), metric);
        for (k, block_size) in [(1, 1), (3, 4), (5, 5)] {
            let label = format!("{metric:?} k={k} b={block_size}");

            let general = block_krylov_svd(&operator, k, 4, block_size, &mut rng)?;
            check_factorization(&general, k, &format!("general {label}"))?;

            let symmetric = symmetric_block_krylov_svd(&operator, k, 4, block_size, &mut rng)?;
            check_factorization(&symmetric, k, &format!("symmetric {label}"))?;

            let (traced, trace) = symmetric_block_krylov_svd_traced(
                &operator,
                k,
                4,
                block_size,
                dense.as_ref(),
                dense.norm_l2(),
                &mut rng,
            )?;
            check_factorization(&traced, k, &format!("traced {label}"))?;
            ensure!(trace.len() == 4);
        }
    }
    Ok(())
}

#[test]
fn test_implicit_and_dense_operators_give_the_same_svd() -> Result<()> {
    // With n ≤ block_size · num_iter the subspace is the whole space, so both
    // runs reproduce the exact top singular values.
    let mut rng = StdRng::seed_from_u64(5);
    let points = random_points(12, 3, &mut rng);
    let dense = dense_distance_matrix(&points, Metric::L1);
    let operator = preprocessed(points, Metric::L1);

    let implicit = symmetric_block_krylov_svd(&operator, 3, 4, 3, &mut StdRng::seed_from_u64(1))?;
    let explicit = symmetric_block_krylov_svd(&dense, 3, 4, 3, &mut StdRng::seed_from_u64(2))?;

    let exact = dense
        .thin_svd()
        .map_err(|e| anyhow!("exact SVD failed: {e:?}"))?;
    let s = exact.S().column_vector();
    let mut sorted: Vec<f64> = (0..s.nrows()).map(|i| s[i]).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));

    for j in 0..3 {
        let tol = 1e-9 * sorted[0];
        ensure!((implicit.s[j] - sorted[j]).abs() < tol, "implicit s[{j}]");
        ensure!((explicit.s[j] - sorted[j]).abs() < tol, "explicit s[{j}]");
    }
    Ok(())
}

#[test]
fn test_l1_operator_requires_preprocessing_in_solvers() {
    let mut rng = StdRng::seed_from_u64(3);
    let operator = DistanceOperator::new(random_points(10, 2, &mut rng), Metric::L1);
    let err = symmetric_block_krylov_svd(&operator, 2, 2, 2, &mut rng).unwrap_err();
    assert_eq!(err.kind(), &distmat_krylov::DistMatErrorKind::NotPreprocessed);
}

// --- Convergence ---

#[test]
fn test_traced_error_decreases_with_iterations() -> Result<()> {
    const N: usize = 20;
    const K: usize = 2;
    const BLOCK: usize = 2;
    const ITERATIONS: usize = 10;
    const SEEDS: u64 = 8;

    // Random symmetric PSD matrix A = B Bᵗ.
    let mut rng = StdRng::seed_from_u64(2024);
    let b = Mat::<f64>::from_fn(N, N, |_, _| rng.random_range(-1.0..1.0));
    let a = b.as_ref() * b.transpose();

    let exact = a.thin_svd().map_err(|e| anyhow!("exact SVD failed: {e:?}"))?;
    let s = exact.S().column_vector();
    let mut sorted: Vec<f64> = (0..N).map(|i| s[i]).collect();
    sorted.sort_by(|x, y| y.total_cmp(x));
    let denominator = sorted[K..].iter().map(|v| v * v).sum::<f64>().sqrt();

    let mut mean_errors = vec![0.0; ITERATIONS];
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (_, trace) = symmetric_block_krylov_svd_traced(
            &a,
            K,
            ITERATIONS,
            BLOCK,
            a.as_ref(),
            denominator,
            &mut rng,
        )?;
        ensure!(trace.len() == ITERATIONS);
        for (mean, error) in mean_errors.iter_mut().zip(trace.errors()) {
            // Eckart–Young: no rank-K matrix beats the optimal residual.
            ensure!(error > -1e-10, "seed {seed}: error {error} below optimum");
            *mean += error / SEEDS as f64;
        }
    }

    for w in mean_errors.windows(2) {
        ensure!(
            w[1] <= w[0] + 1e-10,
            "mean error increased: {:?}",
            mean_errors
        );
    }
    // After 10 blocks of 2 the subspace is all of R^20: the result is optimal.
    let last = mean_errors[ITERATIONS - 1];
    ensure!(last.abs() < 1e-8, "final mean error {last}");
    Ok(())
}
