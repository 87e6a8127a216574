//! Common utilities for data loading and performance measurement.
//!
//! These helpers are used by the experiment binaries and the integration tests:
//!
//! - **`data_loader`**: reads and writes point sets as headerless CSV files,
//!   one point per row.
//!
//! - **`perf`**: platform-specific memory measurement. Currently it reads the
//!   peak resident set size on Linux.

pub mod data_loader;
pub mod perf;
