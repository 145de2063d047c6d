//
// project.rs
//
// Interface to the semantic analysis service, and a workspace-only
// implementation that tracks files and resolves module includes
//

use std::collections::BTreeSet;
use std::sync::RwLock;

use indexmap::IndexMap;
use tower_lsp::lsp_types::Range;

use crate::config::SessionConfig;
use crate::cursor_context::{ChainContext, CursorContext, ModuleCandidates};
use crate::diagnostics::DiagnosticEntry;
use crate::paths::{self, IgnorePatterns};

// ============================================================================
// Query and answer types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Changed,
    Deleted,
}

/// A change to a file on disk, keyed by canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: String,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn new(path: impl Into<String>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Purpose of a reference search. The project may answer differently for
/// each (rename needs every occurrence, highlight only the current file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMode {
    Reference,
    Rename,
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: String,
    pub range: Range,
}

/// Hover answer before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverText {
    /// Declaration text, shown as Lua code
    pub label: String,
    /// Documentation comment
    pub doc: String,
    /// File the symbol was found in, when it is not the current file
    pub provenance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Variable,
    Function,
    Field,
    Module,
    Keyword,
    Class,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub label: String,
    pub kind: CandidateKind,
    pub detail: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub label: String,
    pub parameters: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolCategory {
    Function,
    Variable,
    Field,
    Class,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub category: SymbolCategory,
    pub container: Option<String>,
    pub location: SourceLocation,
}

/// Coloring category of a variable occurrence. The numeric code is what the
/// `luahelper/getVarColor` reply carries as `annotatorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorCategory {
    GlobalVar,
    GlobalFunction,
    Annotation,
}

impl ColorCategory {
    pub fn code(self) -> i32 {
        match self {
            ColorCategory::GlobalVar => 0,
            ColorCategory::GlobalFunction => 1,
            ColorCategory::Annotation => 2,
        }
    }
}

/// Every occurrence of one coloring category in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGroup {
    pub category: ColorCategory,
    pub ranges: Vec<Range>,
}

/// Result of reparsing one edited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAnalysis {
    Clean,
    Errors(Vec<DiagnosticEntry>),
}

// ============================================================================
// Project trait
// ============================================================================

/// The semantic analysis service.
///
/// Methods take `&self`; implementations synchronize internally so that
/// queries can run without the session lock.
pub trait Project: Send + Sync {
    /// Whether the file belongs to the project at all
    fn is_tracked(&self, path: &str) -> bool;

    /// Whether the file is already part of the analyzed set
    fn knows_file(&self, path: &str) -> bool;

    /// Every file in the analyzed set
    fn known_files(&self) -> Vec<String>;

    /// Apply file events. Returns true when the analyzed set changed and a
    /// full reanalysis is due.
    fn handle_file_events(&self, events: &[FileEvent]) -> bool;

    fn find_definitions(&self, path: &str, context: &CursorContext) -> Vec<SourceLocation>;

    /// Resolve an include literal to a file path
    fn find_module(&self, from: &str, candidates: &ModuleCandidates) -> Option<String>;

    fn find_references(
        &self,
        path: &str,
        context: &ChainContext,
        mode: ReferenceMode,
    ) -> Vec<SourceLocation>;

    fn hover_text(&self, path: &str, context: &CursorContext) -> Option<HoverText>;

    fn complete(&self, path: &str, context: &CursorContext) -> Vec<CandidateItem>;

    /// Details for the candidate at `index` in the last completion answer
    fn resolve_completion(&self, index: usize) -> Option<CandidateItem>;

    fn signature_help(&self, path: &str, callee: &ChainContext) -> Vec<SignatureInfo>;

    fn document_symbols(&self, path: &str) -> Vec<SymbolEntry>;

    fn workspace_symbols(&self, query: &str) -> Vec<SymbolEntry>;

    /// Occurrences in `path` to color: globals and annotation names
    fn var_colors(&self, path: &str) -> Vec<ColorGroup>;

    /// Analyze every file; the map holds each file's full diagnostic list
    fn reanalyze_project(&self) -> IndexMap<String, Vec<DiagnosticEntry>>;

    /// Reparse one file from its in-memory content
    fn reanalyze_file(&self, path: &str, content: &[u8]) -> FileAnalysis;

    fn reconfigure(&self, config: &SessionConfig);

    fn file_count(&self) -> usize;

    /// Whether diagnostics should name the entry file they were reached from
    fn show_provenance(&self) -> bool;
}

// ============================================================================
// Workspace project
// ============================================================================

#[derive(Debug, Default)]
struct WorkspaceFiles {
    files: BTreeSet<String>,
    associations: Vec<String>,
    ignore: IgnorePatterns,
}

/// Project that knows the workspace file set but performs no semantic
/// analysis. Semantic queries answer empty; module includes resolve
/// against the known files.
#[derive(Debug, Default)]
pub struct WorkspaceProject {
    inner: RwLock<WorkspaceFiles>,
}

impl WorkspaceProject {
    pub fn new(config: &SessionConfig) -> Self {
        let project = Self::default();
        project.reconfigure(config);
        project
    }
}

impl Project for WorkspaceProject {
    fn is_tracked(&self, path: &str) -> bool {
        let Ok(inner) = self.inner.read() else {
            return false;
        };
        paths::is_lua_file(path, &inner.associations) && !inner.ignore.matches(path)
    }

    fn knows_file(&self, path: &str) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains(path))
            .unwrap_or(false)
    }

    fn known_files(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|inner| inner.files.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn handle_file_events(&self, events: &[FileEvent]) -> bool {
        let Ok(mut inner) = self.inner.write() else {
            return false;
        };
        let mut changed = false;
        for event in events {
            match event.kind {
                FileEventKind::Created | FileEventKind::Changed => {
                    let tracked = paths::is_lua_file(&event.path, &inner.associations)
                        && !inner.ignore.matches(&event.path);
                    if tracked {
                        changed |= inner.files.insert(event.path.clone())
                            || event.kind == FileEventKind::Changed;
                    }
                }
                FileEventKind::Deleted => {
                    changed |= inner.files.remove(&event.path);
                }
            }
        }
        changed
    }

    fn find_definitions(&self, _path: &str, _context: &CursorContext) -> Vec<SourceLocation> {
        Vec::new()
    }

    fn find_module(&self, _from: &str, candidates: &ModuleCandidates) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let lookup = |name: &str| {
            let suffix = format!("/{}", name.trim_start_matches('/'));
            inner
                .files
                .iter()
                .find(|file| file.ends_with(&suffix) || file.as_str() == name)
                .cloned()
        };
        lookup(&candidates.primary).or_else(|| candidates.secondary.as_deref().and_then(lookup))
    }

    fn find_references(
        &self,
        _path: &str,
        _context: &ChainContext,
        _mode: ReferenceMode,
    ) -> Vec<SourceLocation> {
        Vec::new()
    }

    fn hover_text(&self, _path: &str, _context: &CursorContext) -> Option<HoverText> {
        None
    }

    fn complete(&self, _path: &str, _context: &CursorContext) -> Vec<CandidateItem> {
        Vec::new()
    }

    fn resolve_completion(&self, _index: usize) -> Option<CandidateItem> {
        None
    }

    fn signature_help(&self, _path: &str, _callee: &ChainContext) -> Vec<SignatureInfo> {
        Vec::new()
    }

    fn document_symbols(&self, _path: &str) -> Vec<SymbolEntry> {
        Vec::new()
    }

    fn workspace_symbols(&self, _query: &str) -> Vec<SymbolEntry> {
        Vec::new()
    }

    fn var_colors(&self, _path: &str) -> Vec<ColorGroup> {
        Vec::new()
    }

    fn reanalyze_project(&self) -> IndexMap<String, Vec<DiagnosticEntry>> {
        IndexMap::new()
    }

    fn reanalyze_file(&self, _path: &str, _content: &[u8]) -> FileAnalysis {
        FileAnalysis::Clean
    }

    fn reconfigure(&self, config: &SessionConfig) {
        let Ok(mut inner) = self.inner.write() else {
            return;
        };
        inner.associations = config.file_associations.clone();
        inner.ignore = config.analysis_filter();
        let WorkspaceFiles { files, ignore, .. } = &mut *inner;
        files.retain(|file| !ignore.matches(file));
    }

    fn file_count(&self) -> usize {
        self.inner.read().map(|inner| inner.files.len()).unwrap_or(0)
    }

    fn show_provenance(&self) -> bool {
        false
    }
}
