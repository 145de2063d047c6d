// perf.rs - Timing instrumentation for the session layer
//
// Controlled via the SELENITE_PERF environment variable.
//
// Usage:
//   SELENITE_PERF=1 selenite --stdio        # Enable timing logs
//   SELENITE_PERF=verbose selenite --stdio  # Also warn on slow operations

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static PERF_ENABLED: OnceLock<bool> = OnceLock::new();

static PERF_VERBOSE: OnceLock<bool> = OnceLock::new();

fn parse_enabled(value: Option<&str>) -> bool {
    value
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

/// Check if performance timing is enabled
pub fn is_enabled() -> bool {
    *PERF_ENABLED.get_or_init(|| parse_enabled(std::env::var("SELENITE_PERF").ok().as_deref()))
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    *PERF_VERBOSE.get_or_init(|| {
        std::env::var("SELENITE_PERF")
            .map(|v| v.eq_ignore_ascii_case("verbose"))
            .unwrap_or(false)
    })
}

/// RAII timing guard that logs duration on drop
///
/// ```
/// use selenite::perf::TimingGuard;
///
/// let _guard = TimingGuard::new("operation_name");
/// // ... do work ...
/// // Duration logged when _guard goes out of scope
/// ```
pub struct TimingGuard {
    start: Instant,
    name: &'static str,
    threshold_warn_ms: Option<u64>,
    enabled: bool,
}

impl TimingGuard {
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
            threshold_warn_ms: None,
            enabled: is_enabled(),
        }
    }

    /// Timing guard that warns (in verbose mode) past `threshold_ms`
    pub fn with_threshold(name: &'static str, threshold_ms: u64) -> Self {
        Self {
            threshold_warn_ms: Some(threshold_ms),
            ..Self::new(name)
        }
    }

    #[cfg(test)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[cfg(test)]
    /// Complete the timing without logging and return the duration
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        std::mem::forget(self);
        elapsed
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }

        let elapsed = self.start.elapsed();
        log::info!("[PERF] {} completed in {:?}", self.name, elapsed);

        if let Some(threshold) = self.threshold_warn_ms {
            if elapsed.as_millis() > threshold as u128 && is_verbose() {
                log::warn!(
                    "[PERF] {} exceeded threshold ({}ms > {}ms)",
                    self.name,
                    elapsed.as_millis(),
                    threshold
                );
            }
        }
    }
}

/// Startup timings
#[derive(Debug, Default, Clone)]
pub struct PerfMetrics {
    /// Duration of the initial workspace walk
    pub workspace_scan_duration: Option<Duration>,
    /// Number of Lua files found by the walk
    pub files_scanned: usize,
    /// Duration of the first full analysis
    pub first_analysis_duration: Option<Duration>,
}

impl PerfMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_summary(&self) {
        if !is_enabled() {
            return;
        }

        log::info!("[PERF] === Startup Performance Summary ===");

        if let Some(d) = self.workspace_scan_duration {
            log::info!(
                "[PERF] Workspace scan: {:?} ({} files)",
                d,
                self.files_scanned
            );
        }

        if let Some(d) = self.first_analysis_duration {
            log::info!("[PERF] First analysis: {:?}", d);
        }

        if let Some(rss) = peak_rss_bytes() {
            log::info!("[PERF] Peak RSS: {} KiB", rss / 1024);
        }
    }
}

static STARTUP_METRICS: OnceLock<std::sync::Mutex<PerfMetrics>> = OnceLock::new();

pub fn startup_metrics() -> &'static std::sync::Mutex<PerfMetrics> {
    STARTUP_METRICS.get_or_init(|| std::sync::Mutex::new(PerfMetrics::new()))
}

pub fn record_workspace_scan(duration: Duration, files_scanned: usize) {
    if !is_enabled() {
        return;
    }
    if let Ok(mut metrics) = startup_metrics().lock() {
        metrics.workspace_scan_duration = Some(duration);
        metrics.files_scanned = files_scanned;
    }
}

pub fn record_first_analysis(duration: Duration) {
    if !is_enabled() {
        return;
    }
    if let Ok(mut metrics) = startup_metrics().lock() {
        if metrics.first_analysis_duration.is_none() {
            metrics.first_analysis_duration = Some(duration);
            metrics.log_summary();
        }
    }
}

/// Peak resident set size of this process in bytes.
///
/// Read from the `VmHWM` field of `/proc/self/status`; `None` elsewhere.
pub fn peak_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|line| line.strip_prefix("VmHWM:"))
            .and_then(|rest| {
                let trimmed = rest.trim();
                trimmed.strip_suffix("kB").unwrap_or(trimmed).trim().parse::<u64>().ok()
            })
            .map(|kb| kb * 1024)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
