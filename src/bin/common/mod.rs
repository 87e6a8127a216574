//! This module provides shared utilities for the experiment runner executables.
//! It includes common command-line argument definitions and logger setup.

// Each runner uses a different subset of these helpers.
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use clap::{Args, ValueEnum};
use distmat_krylov::Metric;

/// Distance metric selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    /// Manhattan distance.
    L1,
    /// Squared Euclidean distance.
    L2Squared,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::L1 => Metric::L1,
            MetricArg::L2Squared => Metric::SquaredL2,
        }
    }
}

/// Block Krylov parameters shared by the runners that compute an SVD.
#[derive(Args, Debug, Clone, Copy)]
pub struct KrylovArgs {
    /// Target rank k.
    #[clap(long, default_value_t = 5)]
    pub rank: usize,
    /// Number of block Krylov iterations.
    #[clap(long, default_value_t = 10)]
    pub num_iter: usize,
    /// Width of each Krylov block (must be at least `rank`).
    #[clap(long, default_value_t = 8)]
    pub block_size: usize,
}

/// Installs `env_logger` at `Info` level.
pub fn init_logger() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}
