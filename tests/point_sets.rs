//! Data-driven checks over the point sets in `data/points/`.
//!
//! The build script generates one `#[test]` per CSV file, each calling
//! [`run_point_set_checks`]. Adding an instance only requires dropping a new
//! file into the directory.

use anyhow::{Result, ensure};
use distmat_krylov::{
    DistanceMatrix, DistanceOperator, Metric, distance::dense_distance_matrix,
    symmetric_block_krylov_svd, utils::data_loader::load_points,
};
use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng};

const TOLERANCE: f64 = 1e-10;

/// Runs the full battery of operator checks for one instance.
fn run_point_set_checks(name: &str, path: &str) -> Result<()> {
    let points = load_points(path)?;
    let n = points.nrows();
    let mut rng = StdRng::seed_from_u64(n as u64);
    let y = Mat::<f64>::from_fn(n, 3, |_, _| rng.random_range(-1.0..1.0));

    for metric in [Metric::L1, Metric::SquaredL2] {
        let dense = dense_distance_matrix(&points, metric);
        for a in 0..n {
            ensure!(dense[(a, a)] == 0.0, "{name}: nonzero diagonal at {a}");
            for b in 0..a {
                ensure!(dense[(a, b)] == dense[(b, a)], "{name}: asymmetric at ({a}, {b})");
            }
        }

        let mut operator = DistanceOperator::new(points.clone(), metric);
        operator.preprocess();
        let implicit = operator.multiply_matrix(y.as_ref())?;
        let explicit = &dense * &y;
        let scale = explicit.norm_l2().max(1.0);
        let err = (&implicit - &explicit).norm_l2() / scale;
        ensure!(err < TOLERANCE, "{name} {metric:?}: relative error {err}");

        if let DistanceOperator::L1(l1) = &operator {
            let order = l1
                .order_statistics()
                .ok_or_else(|| anyhow::anyhow!("{name}: missing order statistics"))?;
            for i in 0..points.ncols() {
                for k in 0..n {
                    ensure!(order.sorted_index(order.rank(k, i), i) == k);
                }
            }
        }

        if n >= 4 {
            let svd = symmetric_block_krylov_svd(&operator, 2, 3, 3, &mut rng)?;
            ensure!(svd.s.len() == 2 && svd.s[0] >= svd.s[1]);
        }
    }

    if name == "line3" {
        let mut operator = DistanceOperator::new(points, Metric::L1);
        operator.preprocess();
        let ones = Mat::<f64>::from_fn(3, 1, |_, _| 1.0);
        let z = operator.multiply_matrix(ones.as_ref())?;
        ensure!(z == faer::mat![[4.0], [3.0], [5.0]], "line3 row sums: {z:?}");
    }

    Ok(())
}

include!(concat!(env!("OUT_DIR"), "/point_set_tests.rs"));
