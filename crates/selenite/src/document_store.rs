//
// document_store.rs
//
// Buffers of open documents keyed by canonical file path
//

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::perf;
use crate::position::{self, EditOp};

// ============================================================================
// Metrics
// ============================================================================

/// Counters describing how the store has been used
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStoreMetrics {
    /// Number of lookups that found an open document
    pub cache_hits: u64,
    /// Number of lookups for a path that is not open
    pub cache_misses: u64,
    /// Total number of documents opened
    pub documents_opened: u64,
    /// Total number of documents closed
    pub documents_closed: u64,
}

// ============================================================================
// Document State
// ============================================================================

/// State for an open document
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Current buffer. Replaced, never mutated, on every edit.
    pub content: Arc<[u8]>,
    /// Client document version
    pub version: i32,
    /// Internal revision counter, bumped on every replacement
    pub revision: u64,
}

// ============================================================================
// Document Store
// ============================================================================

/// Store for open documents.
///
/// Holds at most one buffer per path. There is no eviction: a document
/// stays authoritative until the client closes it.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, DocumentState>,
    metrics: DocumentStoreMetrics,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any buffer already stored for `path`.
    ///
    /// # Arguments
    /// * `path` - Canonical file path
    /// * `text` - Full document text
    /// * `version` - Client document version
    pub fn open(&mut self, path: &str, text: &str, version: i32) {
        let revision = self
            .documents
            .get(path)
            .map(|doc| doc.revision + 1)
            .unwrap_or(0);
        self.documents.insert(
            path.to_string(),
            DocumentState {
                content: Arc::from(text.as_bytes()),
                version,
                revision,
            },
        );
        self.metrics.documents_opened += 1;
    }

    /// Get the current buffer of a document.
    ///
    /// The returned buffer stays valid after later edits but no longer
    /// reflects them.
    pub fn get(&mut self, path: &str) -> Option<Arc<[u8]>> {
        match self.documents.get(path) {
            Some(doc) => {
                self.metrics.cache_hits += 1;
                Some(Arc::clone(&doc.content))
            }
            None => {
                self.metrics.cache_misses += 1;
                None
            }
        }
    }

    #[cfg(test)]
    /// Get the full document state without touching the metrics.
    pub fn state(&self, path: &str) -> Option<&DocumentState> {
        self.documents.get(path)
    }

    /// Replace the buffer of `path`, creating the entry if needed.
    pub fn set(&mut self, path: &str, content: Vec<u8>) {
        match self.documents.get_mut(path) {
            Some(doc) => {
                doc.content = Arc::from(content);
                doc.revision += 1;
            }
            None => {
                self.documents.insert(
                    path.to_string(),
                    DocumentState {
                        content: Arc::from(content),
                        version: 0,
                        revision: 0,
                    },
                );
            }
        }
    }

    /// Apply client edits to an open document.
    ///
    /// On failure the stored buffer is left untouched.
    ///
    /// # Returns
    /// The new buffer
    pub fn apply_changes(
        &mut self,
        path: &str,
        edits: &[EditOp],
        version: i32,
    ) -> SessionResult<Arc<[u8]>> {
        let Some(doc) = self.documents.get_mut(path) else {
            self.metrics.cache_misses += 1;
            return Err(SessionError::CacheMiss(path.to_string()));
        };
        let next = position::apply_edits(&doc.content, edits)?;
        doc.content = Arc::from(next);
        doc.version = version;
        doc.revision += 1;
        self.metrics.cache_hits += 1;
        Ok(Arc::clone(&doc.content))
    }

    /// Close a document.
    ///
    /// Closing a path that is not open returns `CacheMiss`; callers log it
    /// and carry on.
    pub fn close(&mut self, path: &str) -> SessionResult<()> {
        if self.documents.remove(path).is_none() {
            return Err(SessionError::CacheMiss(path.to_string()));
        }
        self.metrics.documents_closed += 1;
        Ok(())
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    #[cfg(test)]
    /// Paths of all open documents
    pub fn paths(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn metrics(&self) -> &DocumentStoreMetrics {
        &self.metrics
    }

    /// Log the usage counters when perf timing is enabled.
    pub fn log_metrics(&self) {
        if !perf::is_enabled() {
            return;
        }
        let m = &self.metrics;
        log::info!(
            "[PERF] Document store: {} opened, {} closed, {} hits, {} misses",
            m.documents_opened,
            m.documents_closed,
            m.cache_hits,
            m.cache_misses
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn test_open_and_get() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "local a = 1", 1);

        assert!(store.contains("/w/a.lua"));
        assert_eq!(&*store.get("/w/a.lua").unwrap(), b"local a = 1");
        assert_eq!(store.state("/w/a.lua").unwrap().version, 1);
    }

    #[test]
    fn test_reopen_keeps_single_buffer() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "one", 1);
        store.open("/w/a.lua", "two", 2);

        assert_eq!(store.len(), 1);
        assert_eq!(&*store.get("/w/a.lua").unwrap(), b"two");
    }

    #[test]
    fn test_close() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "x", 1);

        assert!(store.close("/w/a.lua").is_ok());
        assert!(!store.contains("/w/a.lua"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_close_unknown_is_cache_miss() {
        let mut store = DocumentStore::new();
        assert_eq!(
            store.close("/w/missing.lua"),
            Err(SessionError::CacheMiss("/w/missing.lua".into()))
        );
        assert_eq!(store.metrics().documents_closed, 0);
    }

    #[test]
    fn test_set_replaces_buffer_and_bumps_revision() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "old", 1);
        let before = store.get("/w/a.lua").unwrap();

        store.set("/w/a.lua", b"new".to_vec());

        // Earlier readers keep their snapshot
        assert_eq!(&*before, b"old");
        assert_eq!(&*store.get("/w/a.lua").unwrap(), b"new");
        assert_eq!(store.state("/w/a.lua").unwrap().revision, 1);
    }

    #[test]
    fn test_set_creates_missing_entry() {
        let mut store = DocumentStore::new();
        store.set("/w/b.lua", b"return 1".to_vec());
        assert!(store.contains("/w/b.lua"));
    }

    #[test]
    fn test_apply_changes() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "local a = 1\n", 1);

        let edit = EditOp::Range {
            start: Position::new(0, 7),
            end: Position::new(0, 7),
            text: ".".into(),
        };
        let content = store.apply_changes("/w/a.lua", &[edit], 2).unwrap();

        assert_eq!(&*content, b"local a. = 1\n");
        let doc = store.state("/w/a.lua").unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.revision, 1);
    }

    #[test]
    fn test_failed_changes_keep_buffer() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "abc", 1);

        let edit = EditOp::Range {
            start: Position::new(4, 0),
            end: Position::new(4, 0),
            text: "x".into(),
        };
        assert!(store.apply_changes("/w/a.lua", &[edit], 2).is_err());
        assert_eq!(&*store.get("/w/a.lua").unwrap(), b"abc");
        assert_eq!(store.state("/w/a.lua").unwrap().version, 1);
    }

    #[test]
    fn test_apply_changes_to_unopened_document() {
        let mut store = DocumentStore::new();
        let result = store.apply_changes("/w/none.lua", &[EditOp::Full("x".into())], 1);
        assert!(matches!(result, Err(SessionError::CacheMiss(_))));
    }

    #[test]
    fn test_metrics() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "x", 1);
        assert_eq!(store.metrics().documents_opened, 1);

        let _ = store.get("/w/a.lua");
        assert_eq!(store.metrics().cache_hits, 1);

        let _ = store.get("/w/b.lua");
        assert_eq!(store.metrics().cache_misses, 1);

        store.close("/w/a.lua").unwrap();
        assert_eq!(store.metrics().documents_closed, 1);
        store.log_metrics();
    }

    #[test]
    fn test_paths() {
        let mut store = DocumentStore::new();
        store.open("/w/a.lua", "", 1);
        store.open("/w/b.lua", "", 1);

        let mut paths = store.paths();
        paths.sort();
        assert_eq!(paths, vec!["/w/a.lua".to_string(), "/w/b.lua".to_string()]);
    }

    #[test]
    fn test_metrics_default() {
        let metrics = DocumentStoreMetrics::default();
        assert_eq!(metrics.cache_hits, 0);
        assert_eq!(metrics.cache_misses, 0);
        assert_eq!(metrics.documents_opened, 0);
        assert_eq!(metrics.documents_closed, 0);
    }
}
