//! Experiment Runner for the Convergence Analysis.
//!
//! This executable measures how fast the symmetric block Krylov SVD of an
//! implicit distance matrix approaches the optimal rank-k approximation. For a
//! point set it:
//!
//! 1. materialises the dense distance matrix `D` as the reference,
//! 2. computes the optimal rank-k residual `‖D − D_k‖_F` from an exact SVD,
//! 3. runs the traced solver on the implicit operator for several seeds,
//! 4. writes one CSV row per (seed, iteration) with the relative error
//!    `‖U S Vᵗ − D‖_F / ‖D − D_k‖_F − 1` and the iteration time.
//!
//! The dense steps are O(n²) in memory, so this runner is meant for point
//! sets of a few thousand points at most.

mod common;

use anyhow::{Context, Result, anyhow, ensure};
use clap::Parser;
use common::{KrylovArgs, MetricArg};
use distmat_krylov::{
    DistanceOperator, Metric,
    distance::dense_distance_matrix,
    symmetric_block_krylov_svd_traced,
    utils::data_loader::load_points,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line arguments for the convergence runner.
#[derive(Parser, Debug)]
#[clap(
    name = "convergence-runner",
    about = "Records per-iteration error of the symmetric block Krylov SVD of a distance matrix."
)]
struct ConvergenceArgs {
    /// Path to the point set CSV (one point per line).
    #[clap(long, value_name = "PATH")]
    points: PathBuf,
    /// Distance metric of the matrix.
    #[clap(long, value_enum, default_value_t = MetricArg::L1)]
    metric: MetricArg,
    #[clap(flatten)]
    krylov: KrylovArgs,
    /// Number of independent runs, each with its own seed.
    #[clap(long, default_value_t = 5)]
    repeats: u64,
    /// Seed of the first run; run `r` uses `seed + r`.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of data in the output CSV file.
#[derive(Debug, Serialize)]
struct ConvergenceRow {
    seed: u64,
    iteration: usize,
    relative_error: f64,
    elapsed_s: f64,
}

fn main() -> Result<()> {
    common::init_logger()?;
    let args = ConvergenceArgs::parse();
    let metric = Metric::from(args.metric);
    let KrylovArgs {
        rank,
        num_iter,
        block_size,
    } = args.krylov;

    let points = load_points(&args.points)
        .with_context(|| format!("Failed to load points from {:?}", &args.points))?;
    let n = points.nrows();
    log::info!(
        "Loaded {} points x {} features; metric {:?}, rank {}, {} iterations, block size {}",
        n,
        points.ncols(),
        metric,
        rank,
        num_iter,
        block_size
    );
    ensure!(rank < n, "rank ({rank}) must be smaller than the number of points ({n})");

    // Reference and optimal residual from the materialised matrix.
    let dense = dense_distance_matrix(&points, metric);
    let exact = dense
        .thin_svd()
        .map_err(|e| anyhow!("Exact SVD of the dense distance matrix failed: {:?}", e))?;
    let singular_values = exact.S().column_vector();
    let mut sorted: Vec<f64> = (0..singular_values.nrows()).map(|i| singular_values[i]).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let denominator = sorted[rank..].iter().map(|s| s * s).sum::<f64>().sqrt();
    ensure!(
        denominator > 0.0,
        "The distance matrix has rank at most {rank}; the relative error is undefined."
    );
    log::info!("Optimal rank-{rank} residual: {denominator:.6e}");

    let mut operator = DistanceOperator::new(points, metric);
    operator.preprocess();

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {:?}", &args.output))?;
    let mut final_errors = Vec::with_capacity(args.repeats as usize);

    for run in 0..args.repeats {
        let seed = args.seed + run;
        let mut rng = StdRng::seed_from_u64(seed);
        let (_, trace) = symmetric_block_krylov_svd_traced(
            &operator,
            rank,
            num_iter,
            block_size,
            dense.as_ref(),
            denominator,
            &mut rng,
        )?;

        for record in trace.records() {
            writer.serialize(ConvergenceRow {
                seed,
                iteration: record.iteration,
                relative_error: record.relative_error,
                elapsed_s: record.elapsed_s,
            })?;
        }
        if let Some(last) = trace.records().last() {
            log::info!("Seed {seed}: final relative error {:.3e}", last.relative_error);
            final_errors.push(last.relative_error);
        }
    }
    writer.flush()?;

    if !final_errors.is_empty() {
        let mean = final_errors.iter().sum::<f64>() / final_errors.len() as f64;
        log::info!("Mean final relative error over {} runs: {mean:.3e}", final_errors.len());
    }
    log::info!("Convergence experiment complete; results in {:?}", &args.output);
    Ok(())
}
