//! Sinks that keep everything they are sent, for assertions.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tower_lsp::lsp_types::Diagnostic;

use crate::session::DiagnosticSink;
use crate::telemetry::{UsageReport, UsageSink};

/// Records every diagnostic notification in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(String, Vec<Diagnostic>)>>,
}

impl RecordingSink {
    pub async fn published(&self) -> Vec<(String, Vec<Diagnostic>)> {
        self.published.lock().await.clone()
    }

    /// Latest notification for `path`; `None` if it was never published.
    pub async fn last_for(&self, path: &str) -> Option<Vec<Diagnostic>> {
        self.published
            .lock()
            .await
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, diagnostics)| diagnostics.clone())
    }

    /// Number of notifications sent for `path`.
    pub async fn count_for(&self, path: &str) -> usize {
        self.published
            .lock()
            .await
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }
}

#[async_trait]
impl DiagnosticSink for RecordingSink {
    async fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        self.published
            .lock()
            .await
            .push((path.to_string(), diagnostics));
    }
}

#[derive(Debug, Default)]
pub struct RecordingUsageSink {
    reports: Mutex<Vec<UsageReport>>,
}

impl RecordingUsageSink {
    pub async fn reports(&self) -> Vec<UsageReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl UsageSink for RecordingUsageSink {
    async fn send(&self, report: UsageReport) {
        self.reports.lock().await.push(report);
    }
}
