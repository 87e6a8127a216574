//! A data generation utility for creating random point sets.
//!
//! Writes `n` points with `d` features to a headerless CSV file that the other
//! runners (and `load_points`) read. Generation is seeded so instances are
//! reproducible.

mod common;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use distmat_krylov::{PointSet, utils::data_loader::write_points};
use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use std::path::PathBuf;

/// Distribution of the generated coordinates.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Distribution {
    /// Independent coordinates, uniform on [0, 1).
    Uniform,
    /// Independent standard normal coordinates.
    Gaussian,
}

/// Command-line interface for the point set generator.
#[derive(Parser, Debug)]
#[clap(
    name = "datagen",
    about = "Generates a reproducible random point set as headerless CSV."
)]
struct DataGenArgs {
    /// Number of points.
    #[clap(long)]
    n: usize,
    /// Number of features per point.
    #[clap(long)]
    d: usize,
    /// Coordinate distribution.
    #[clap(long, value_enum, default_value_t = Distribution::Uniform)]
    distribution: Distribution,
    /// Seed for the random generator.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path of the CSV file to write.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

fn main() -> Result<()> {
    common::init_logger()?;

    let args = DataGenArgs::parse();
    log::info!("Generating point set with parameters: {:?}", &args);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let values = match args.distribution {
        Distribution::Uniform => Mat::from_fn(args.n, args.d, |_, _| rng.random::<f64>()),
        Distribution::Gaussian => {
            Mat::from_fn(args.n, args.d, |_, _| rng.sample::<f64, _>(StandardNormal))
        }
    };
    let points = PointSet::from_mat(values.as_ref()).context("Invalid point set dimensions")?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    write_points(&args.output, &points)
        .with_context(|| format!("Failed to write points to {:?}", &args.output))?;

    log::info!("Wrote {} points x {} features to {:?}", args.n, args.d, &args.output);
    Ok(())
}
