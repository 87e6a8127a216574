//! Experiment Runner for the Scalability Analysis.
//!
//! For a range of problem sizes `n`, this executable generates a random point
//! set and times the product of the n×n distance matrix with a block of
//! vectors, three ways:
//!
//! - `l1`: the implicit L1 operator (preprocessing timed separately),
//! - `l2-squared`: the implicit squared-L2 operator,
//! - `dense-l1`: materialising the L1 matrix and multiplying it with `faer`,
//!   only up to `--dense-limit` points since it needs O(n²) memory.
//!
//! Each measurement becomes one CSV row together with the process' peak RSS
//! at that point. Peak RSS only grows, so the dense rows are run last for
//! every size.

mod common;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use distmat_krylov::{
    DistanceMatrix, Metric, PointSet,
    distance::{L1DistanceMatrix, SquaredL2DistanceMatrix, dense_distance_matrix},
    utils::perf::peak_rss_kb,
};
use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

/// Command-line arguments for the scalability runner.
#[derive(Parser, Debug)]
#[clap(
    name = "scalability-runner",
    about = "Times implicit vs dense distance matrix products for growing n."
)]
struct ScalabilityArgs {
    /// Smallest number of points.
    #[clap(long, default_value_t = 1000)]
    n_start: usize,
    /// Largest number of points.
    #[clap(long, default_value_t = 10000)]
    n_end: usize,
    /// Step between sizes.
    #[clap(long, default_value_t = 1000)]
    n_step: usize,
    /// Number of features per point.
    #[clap(long, default_value_t = 10)]
    d: usize,
    /// Number of columns of the multiplied block.
    #[clap(long, default_value_t = 8)]
    block: usize,
    /// Largest n for which the dense baseline is run.
    #[clap(long, default_value_t = 5000)]
    dense_limit: usize,
    /// Seed for the random points and block.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file for storing results.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// One row of the output CSV.
#[derive(Debug, Serialize)]
struct ScalabilityResult {
    method: &'static str,
    n: usize,
    d: usize,
    preprocess_s: f64,
    multiply_s: f64,
    rss_kb: Option<u64>,
}

fn main() -> Result<()> {
    common::init_logger()?;
    let args = ScalabilityArgs::parse();
    ensure!(args.n_step > 0, "--n-step must be positive");
    ensure!(args.n_start > 0 && args.d > 0, "--n-start and --d must be positive");

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {:?}", &args.output))?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    for n in (args.n_start..=args.n_end).step_by(args.n_step) {
        log::info!("Running n = {n} (d = {}, block = {})", args.d, args.block);
        let points =
            PointSet::from_mat(Mat::from_fn(n, args.d, |_, _| rng.random::<f64>()).as_ref())?;
        let block = Mat::<f64>::from_fn(n, args.block, |_, _| rng.random_range(-1.0..1.0));

        let start = Instant::now();
        let l1 = L1DistanceMatrix::preprocessed(points.clone());
        let preprocess_s = start.elapsed().as_secs_f64();
        let start = Instant::now();
        let implicit_l1 = l1.multiply_matrix(block.as_ref())?;
        writer.serialize(ScalabilityResult {
            method: "l1",
            n,
            d: args.d,
            preprocess_s,
            multiply_s: start.elapsed().as_secs_f64(),
            rss_kb: peak_rss_kb(),
        })?;

        let l2 = SquaredL2DistanceMatrix::new(points.clone());
        let start = Instant::now();
        let _ = l2.multiply_matrix(block.as_ref())?;
        writer.serialize(ScalabilityResult {
            method: "l2-squared",
            n,
            d: args.d,
            preprocess_s: 0.0,
            multiply_s: start.elapsed().as_secs_f64(),
            rss_kb: peak_rss_kb(),
        })?;

        if n <= args.dense_limit {
            let start = Instant::now();
            let dense = dense_distance_matrix(&points, Metric::L1);
            let preprocess_s = start.elapsed().as_secs_f64();
            let start = Instant::now();
            let explicit = &dense * &block;
            let multiply_s = start.elapsed().as_secs_f64();

            let rel_diff = (&explicit - &implicit_l1).norm_l2() / explicit.norm_l2();
            if rel_diff > 1e-10 {
                log::warn!("n = {n}: implicit and dense L1 products differ by {rel_diff:.3e}");
            }
            writer.serialize(ScalabilityResult {
                method: "dense-l1",
                n,
                d: args.d,
                preprocess_s,
                multiply_s,
                rss_kb: peak_rss_kb(),
            })?;
        }
        writer.flush()?;
    }

    log::info!("Scalability experiment complete; results in {:?}", &args.output);
    Ok(())
}
