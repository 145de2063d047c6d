//
// telemetry.rs
//
// Periodic usage report. One task per process; it reads only atomic
// counters and never touches the session lock.
//

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Set once a report task has been started in this process.
static REPORT_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Counters updated by the session and read by the report task.
#[derive(Debug, Default)]
pub struct UsageCounters {
    file_count: AtomicU64,
    workspace_folders: AtomicU64,
    load_cost_ms: AtomicU64,
    requests: AtomicU64,
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file_count(&self, count: usize) {
        self.file_count.store(count as u64, Ordering::Relaxed);
    }

    pub fn set_workspace_folders(&self, count: usize) {
        self.workspace_folders.store(count as u64, Ordering::Relaxed);
    }

    pub fn set_load_cost(&self, cost: Duration) {
        self.load_cost_ms
            .store(cost.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Snapshot the counters into a report.
    pub fn report(&self, client: &str, first: bool) -> UsageReport {
        UsageReport {
            client_type: client.to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            os_type: std::env::consts::OS.to_string(),
            file_count: self.file_count.load(Ordering::Relaxed),
            workspace_folders: self.workspace_folders.load(Ordering::Relaxed),
            load_cost_ms: self.load_cost_ms.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            first_report: first,
        }
    }
}

/// One usage report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub client_type: String,
    pub client_version: String,
    pub os_type: String,
    pub file_count: u64,
    pub workspace_folders: u64,
    pub load_cost_ms: u64,
    pub requests: u64,
    /// First report sent by this process
    pub first_report: bool,
}

/// Destination of usage reports.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn send(&self, report: UsageReport);
}

/// Sink that writes reports to the log.
#[derive(Debug, Default)]
pub struct LogUsageSink;

#[async_trait]
impl UsageSink for LogUsageSink {
    async fn send(&self, report: UsageReport) {
        match serde_json::to_string(&report) {
            Ok(json) => log::info!("Usage report: {}", json),
            Err(e) => log::warn!("Failed to serialize usage report: {}", e),
        }
    }
}

/// Handle to the running report task.
#[derive(Debug)]
pub struct UsageReporter {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl UsageReporter {
    /// Start the report task unless one already runs in this process.
    ///
    /// # Arguments
    /// * `counters` - Counters shared with the session
    /// * `sink` - Where reports go
    /// * `client` - Client type reported with every snapshot
    /// * `interval` - Time between reports; the first report is immediate
    pub fn start(
        counters: Arc<UsageCounters>,
        sink: Arc<dyn UsageSink>,
        client: String,
        interval: Duration,
    ) -> Option<Self> {
        if REPORT_CLAIMED.swap(true, Ordering::SeqCst) {
            log::trace!("Usage report task already running");
            return None;
        }
        Some(Self::spawn(counters, sink, client, interval))
    }

    fn spawn(
        counters: Arc<UsageCounters>,
        sink: Arc<dyn UsageSink>,
        client: String,
        interval: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            log::info!("Usage report task started (every {:?})", interval);
            let mut ticker = tokio::time::interval(interval);
            let mut first = true;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        log::info!("Usage report task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        sink.send(counters.report(&client, first)).await;
                        first = false;
                    }
                }
            }
        });
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for UsageReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingUsageSink;

    #[test]
    fn test_report_snapshot() {
        let counters = UsageCounters::new();
        counters.set_file_count(12);
        counters.set_workspace_folders(2);
        counters.set_load_cost(Duration::from_millis(150));
        counters.record_request();
        counters.record_request();

        let report = counters.report("vsc", true);
        assert_eq!(report.client_type, "vsc");
        assert_eq!(report.file_count, 12);
        assert_eq!(report.workspace_folders, 2);
        assert_eq!(report.load_cost_ms, 150);
        assert_eq!(report.requests, 2);
        assert!(report.first_report);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = UsageCounters::new().report("vim", false);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["clientType"], "vim");
        assert_eq!(json["firstReport"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_on_interval_until_shutdown() {
        let counters = Arc::new(UsageCounters::new());
        let sink = Arc::new(RecordingUsageSink::default());
        let mut reporter = UsageReporter::spawn(
            counters.clone(),
            sink.clone(),
            "vsc".into(),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(sink.reports().await.len(), 1);

        counters.set_file_count(3);
        tokio::time::sleep(Duration::from_secs(60)).await;
        let reports = sink.reports().await;
        assert_eq!(reports.len(), 2);
        assert!(reports[0].first_report);
        assert!(!reports[1].first_report);
        assert_eq!(reports[1].file_count, 3);

        reporter.shutdown();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(sink.reports().await.len(), 2);
    }
}
