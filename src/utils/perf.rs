//! Memory measurement for experiments.
//!
//! Timings are taken with [`std::time::Instant`] directly at the call sites;
//! this module only covers the part that needs the operating system.

/// Peak resident set size of the current process, in kilobytes.
///
/// Reads the `VmHWM` ("high water mark") line of `/proc/self/status`.
/// Returns `None` if the file or the line cannot be read.
#[cfg(target_os = "linux")]
pub fn peak_rss_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_status_kb(&status, "VmHWM:")
}

/// Always `None` outside Linux.
#[cfg(not(target_os = "linux"))]
pub fn peak_rss_kb() -> Option<u64> {
    use std::sync::Once;
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Peak RSS measurement is only supported on Linux.");
    });
    None
}

/// Extracts the kB value of the line starting with `key` from a
/// `/proc/<pid>/status` dump.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_kb(status: &str, key: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}
