//
// state.rs
//
// Server lifecycle state and the mutable session state guarded by the
// session lock
//

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::diagnostics::DiagnosticsReconciler;
use crate::document_store::DocumentStore;
use crate::error::{SessionError, SessionResult};
use crate::paths::IgnorePatterns;

/// Lifecycle of the server as driven by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    #[default]
    Created,
    Initializing,
    Initialized,
    ShutDown,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Created => "created",
            ServerState::Initializing => "initializing",
            ServerState::Initialized => "initialized",
            ServerState::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

impl ServerState {
    /// Fails unless document and query traffic is allowed.
    pub fn ensure_serving(self) -> SessionResult<()> {
        if self == ServerState::Initialized {
            Ok(())
        } else {
            Err(SessionError::StateViolation(self))
        }
    }
}

// ============================================================================
// Highlight throttle
// ============================================================================

/// Suppresses document highlights for a quiet period after a clean edit.
///
/// Highlights are requested on every caret move; right after typing, the
/// project answer is about to be replaced anyway.
#[derive(Debug, Clone, Default)]
pub struct HighlightThrottle {
    quiet: Duration,
    last_clean_edit: Option<Instant>,
}

impl HighlightThrottle {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_clean_edit: None,
        }
    }

    pub fn set_quiet(&mut self, quiet: Duration) {
        self.quiet = quiet;
    }

    pub fn record_clean_edit(&mut self, now: Instant) {
        self.last_clean_edit = Some(now);
    }

    /// End any running quiet period.
    pub fn reset(&mut self) {
        self.last_clean_edit = None;
    }

    /// Whether a highlight request at `now` falls inside the quiet period.
    pub fn is_quiet(&self, now: Instant) -> bool {
        match self.last_clean_edit {
            Some(at) => now.saturating_duration_since(at) < self.quiet,
            None => false,
        }
    }
}

// ============================================================================
// Session state
// ============================================================================

/// Everything mutated under the session lock.
#[derive(Debug)]
pub struct SessionState {
    pub server_state: ServerState,
    pub documents: DocumentStore,
    pub diagnostics: DiagnosticsReconciler,
    pub config: SessionConfig,
    /// Compiled `ignore_file_or_dir_error` patterns
    pub error_filter: IgnorePatterns,
    /// Canonical paths of the workspace folders
    pub workspace_folders: Vec<String>,
    /// Whether the client has echoed its base settings yet
    pub settings_received: bool,
    pub highlight: HighlightThrottle,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        log::info!("Session configuration:");
        log::info!("  client: {}", config.client);
        log::info!("  reference_max_num: {}", config.reference_max_num);
        log::info!("  reference_include_define: {}", config.reference_include_define);
        log::info!("  preview_fields_num: {}", config.preview_fields_num);
        log::info!("  require_path_separator: {:?}", config.require_path_separator);
        log::info!("  highlight_quiet_ms: {}", config.highlight_quiet_ms);
        log::info!("  enable_report: {}", config.enable_report);

        Self {
            server_state: ServerState::Created,
            documents: DocumentStore::new(),
            diagnostics: DiagnosticsReconciler::new(),
            highlight: HighlightThrottle::new(Duration::from_millis(config.highlight_quiet_ms)),
            error_filter: config.error_filter(),
            config,
            workspace_folders: Vec::new(),
            settings_received: false,
        }
    }

    /// Install a new configuration, keeping derived state in step.
    pub fn apply_config(&mut self, config: SessionConfig) {
        self.highlight
            .set_quiet(Duration::from_millis(config.highlight_quiet_ms));
        self.error_filter = config.error_filter();
        self.config = config;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ServerState::Created.to_string(), "created");
        assert_eq!(ServerState::Initializing.to_string(), "initializing");
        assert_eq!(ServerState::Initialized.to_string(), "initialized");
        assert_eq!(ServerState::ShutDown.to_string(), "shut down");
    }

    #[test]
    fn test_only_initialized_serves() {
        assert!(ServerState::Initialized.ensure_serving().is_ok());
        for state in [
            ServerState::Created,
            ServerState::Initializing,
            ServerState::ShutDown,
        ] {
            assert_eq!(
                state.ensure_serving(),
                Err(SessionError::StateViolation(state))
            );
        }
    }

    #[test]
    fn test_highlight_throttle() {
        let start = Instant::now();
        let mut throttle = HighlightThrottle::new(Duration::from_millis(3000));
        assert!(!throttle.is_quiet(start));

        throttle.record_clean_edit(start);
        assert!(throttle.is_quiet(start + Duration::from_millis(2999)));
        assert!(!throttle.is_quiet(start + Duration::from_millis(3000)));
    }

    #[test]
    fn test_reset_ends_quiet_period() {
        let start = Instant::now();
        let mut throttle = HighlightThrottle::new(Duration::from_millis(3000));
        throttle.record_clean_edit(start);
        throttle.reset();
        assert!(!throttle.is_quiet(start + Duration::from_millis(1)));
    }

    #[test]
    fn test_zero_quiet_period_never_suppresses() {
        let start = Instant::now();
        let mut throttle = HighlightThrottle::new(Duration::ZERO);
        throttle.record_clean_edit(start);
        assert!(!throttle.is_quiet(start));
    }

    #[test]
    fn test_apply_config_updates_throttle() {
        let mut state = SessionState::default();
        let now = Instant::now();
        state.highlight.record_clean_edit(now);
        assert!(state.highlight.is_quiet(now + Duration::from_millis(10)));

        state.apply_config(SessionConfig {
            highlight_quiet_ms: 0,
            ..Default::default()
        });
        assert!(!state.highlight.is_quiet(now + Duration::from_millis(10)));
        assert_eq!(state.server_state, ServerState::Created);
    }
}
